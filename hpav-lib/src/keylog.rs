/*
 * Copyright (C) 2015-2022 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 * Reference:
 *   https://www.ietf.org/archive/id/draft-thomson-tls-keylogfile-00.html
 *
 * Note:
 *   disclosure datagrams carry NSS key-log text so that captured V2G TLS
 *   traffic can be decrypted passively; the store file is shared with the
 *   decryption engine which tail-reads it on each reload signal
 */

use crate::prelude::*;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyLogError {
    #[error("keylog store {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// One grammar-valid disclosure line, borrowed from the datagram text.
// |LABEL[seq]| |CLIENT_RANDOM hex| |SECRET hex|
// LABEL  : uppercase word, optional trailing epoch digits
// RANDOM : hex identifier of the TLS session (client random or similar)
// SECRET : hex key material
#[derive(Clone, Copy, Debug)]
struct SecretLine<'a> {
    text: &'a str,
    token: &'a str,  // full first token, label + optional epoch
    label: Option<SecretLabel>,
    random: &'a str,
    secret: &'a str,
}

fn is_hex(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_hexdigit())
}

// Strict per-line grammar: exactly three whitespace separated fields, the
// first an uppercase word with optional trailing digits, the rest hex.
fn match_grammar(line: &str) -> Option<SecretLine> {
    let mut fields = line.split_whitespace();
    let token = fields.next()?;
    let random = fields.next()?;
    let secret = fields.next()?;
    if fields.next().is_some() {
        return None;
    }

    let prefix_len = token
        .bytes()
        .take_while(|b| b.is_ascii_uppercase() || *b == b'_')
        .count();
    if prefix_len == 0 || !token[prefix_len..].bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !is_hex(random) || !is_hex(secret) {
        return None;
    }

    Some(SecretLine {
        text: line,
        token,
        label: SecretLabel::from_prefix(&token[..prefix_len]),
        random,
        secret,
    })
}

// info column text: unique secret kinds in arrival order
fn info_summary(lines: &[SecretLine]) -> String {
    let mut kinds: Vec<&'static str> = Vec::new();
    for line in lines {
        if let Some(label) = line.label {
            let text = label.describe();
            if !kinds.contains(&text) {
                kinds.push(text);
            }
        }
    }
    if kinds.is_empty() {
        "TLS secrets disclosure".to_string()
    } else {
        format!("TLS secrets disclosure: {}", kinds.join(", "))
    }
}

enum StoreMatch {
    Absent,
    Identical,
    Conflict,
}

// Scan every persisted line: an identical triple wins over a conflicting
// pair, the store may legitimately hold both values after a past conflict.
fn scan_store(existing: &str, candidate: &SecretLine) -> StoreMatch {
    let mut conflict = false;
    for line in existing.lines() {
        let mut fields = line.split_whitespace();
        let (Some(token), Some(random), Some(secret)) =
            (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        if token == candidate.token && random == candidate.random {
            if secret == candidate.secret {
                return StoreMatch::Identical;
            }
            conflict = true;
        }
    }
    if conflict {
        StoreMatch::Conflict
    } else {
        StoreMatch::Absent
    }
}

// Secret disclosure processor. Owns the store path and the set of packet
// numbers already persisted this session; one instance per capture, reset
// when the host re-initializes the dissection.
pub struct KeyLogManager {
    store_path: PathBuf,
    processed: HashSet<u32>,
}

impl KeyLogManager {
    pub fn new(store_path: PathBuf) -> KeyLogManager {
        KeyLogManager {
            store_path,
            processed: HashSet::new(),
        }
    }

    // store path from the host configuration port, falling back to the
    // built-in temp-dir default
    pub fn from_host(env: &dyn HostEnv) -> KeyLogManager {
        KeyLogManager::new(env.keylog_path().unwrap_or_else(keylog_default_path))
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    // forget which packets were persisted, the store itself is untouched
    pub fn reset(&mut self) {
        self.processed.clear();
    }

    // Dispatcher entry for one datagram payload. Returns the number of
    // consumed bytes, 0 meaning the payload is no disclosure message and
    // other handlers should get a try. Never fails the dissection: store
    // and host troubles degrade to warning annotations.
    pub fn process(&mut self, env: &mut dyn HostEnv, packet_num: u32, payload: &[u8]) -> usize {
        let Ok(text) = std::str::from_utf8(payload) else {
            return 0;
        };

        // all-or-nothing plausibility gate: one malformed line rejects the
        // whole datagram, secrets never travel mixed with other content
        let lines: Vec<&str> = text
            .split(['\r', '\n'])
            .filter(|line| !line.is_empty())
            .collect();
        if lines.is_empty() {
            return 0;
        }
        let mut parsed: Vec<SecretLine> = Vec::with_capacity(lines.len());
        for line in lines {
            match match_grammar(line) {
                Some(secret) => parsed.push(secret),
                None => return 0,
            }
        }

        // length window keeps corrupt or truncated lines out of the store,
        // independently of label recognition
        let candidates: Vec<SecretLine> = parsed
            .iter()
            .copied()
            .filter(|line| {
                line.text.len() >= KEYLOG_LINE_MIN_LEN && line.text.len() < KEYLOG_LINE_MAX_LEN
            })
            .collect();
        if candidates.is_empty() {
            return 0;
        }

        let consumed = payload.len();
        env.set_info(&info_summary(&parsed));
        log::debug!(
            "keylog packet {}: {} candidate line(s)",
            packet_num,
            candidates.len()
        );

        let version = env.version();
        if !version_supported(version, HOST_VERSION_MIN) {
            let (maj, min, mic) = HOST_VERSION_MIN;
            log::warn!("host {:?} below {:?}, keylog persistence disabled", version, HOST_VERSION_MIN);
            env.add_annotation(
                Severity::Warning,
                &format!(
                    "host release too old to persist TLS secrets (need {}.{}.{})",
                    maj, min, mic
                ),
            );
            return consumed;
        }

        // redelivery of an already persisted packet, e.g. after a reload
        // triggered re-dissection
        if self.processed.contains(&packet_num) {
            return consumed;
        }

        let existing = match self.read_store() {
            Ok(content) => content,
            Err(err) => {
                log::warn!("{}", err);
                env.add_annotation(Severity::Warning, &err.to_string());
                return consumed;
            }
        };

        let mut survivors: Vec<SecretLine> = Vec::new();
        let mut conflict_raised = false;
        for candidate in candidates {
            match scan_store(&existing, &candidate) {
                StoreMatch::Identical => continue,
                StoreMatch::Absent => survivors.push(candidate),
                StoreMatch::Conflict => {
                    // both values stay on file, a human must investigate;
                    // one annotation per packet is enough
                    if !conflict_raised {
                        env.add_annotation(
                            Severity::Warning,
                            &format!(
                                "conflicting secret for {} {}: key reuse or corruption",
                                candidate.token, candidate.random
                            ),
                        );
                        conflict_raised = true;
                    }
                    survivors.push(candidate);
                }
            }
        }

        if !survivors.is_empty() {
            if let Err(err) = self.append_lines(&survivors) {
                log::warn!("{}", err);
                env.add_annotation(Severity::Warning, &err.to_string());
                return consumed;
            }
            self.processed.insert(packet_num);
            // store is flushed, let the decryption engine pick the keys up
            env.reload_keys();
        } else {
            // everything already on file, remember the packet anyway so
            // redelivery skips the store scan
            self.processed.insert(packet_num);
        }

        consumed
    }

    fn read_store(&self) -> Result<String, KeyLogError> {
        match fs::read_to_string(&self.store_path) {
            Ok(content) => Ok(content),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(KeyLogError::Store {
                path: self.store_path.display().to_string(),
                source: err,
            }),
        }
    }

    fn append_lines(&self, lines: &[SecretLine]) -> Result<(), KeyLogError> {
        let store = |source| KeyLogError::Store {
            path: self.store_path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.store_path)
            .map_err(store)?;
        for line in lines {
            file.write_all(line.text.as_bytes()).map_err(store)?;
            file.write_all(b"\n").map_err(store)?;
        }
        // the decryption engine re-reads on signal, make the bytes durable
        file.sync_all().map_err(store)?;
        Ok(())
    }
}
