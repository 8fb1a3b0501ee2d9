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
 * Reference:
 *   https://www.ietf.org/archive/id/draft-thomson-tls-keylogfile-00.html
 */
use serde::{Deserialize, Serialize};
use std::fmt;

// Secret kinds carried by NSS key-log disclosure lines. The label is the
// first whitespace-separated token of the line; TLS 1.3 per-epoch traffic
// secrets append an epoch number to the label, so matching is done on the
// alphabetic prefix only.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SecretLabel {
    ClientRandom,
    ClientHandshakeTrafficSecret,
    ServerHandshakeTrafficSecret,
    ExporterSecret,
    ClientTrafficSecret,
    ServerTrafficSecret,
}

impl SecretLabel {
    // label token stripped of its optional trailing epoch digits
    pub fn from_prefix(prefix: &str) -> Option<SecretLabel> {
        let label = match prefix {
            "CLIENT_RANDOM" => SecretLabel::ClientRandom,
            "CLIENT_HANDSHAKE_TRAFFIC_SECRET" => SecretLabel::ClientHandshakeTrafficSecret,
            "SERVER_HANDSHAKE_TRAFFIC_SECRET" => SecretLabel::ServerHandshakeTrafficSecret,
            "EXPORTER_SECRET" => SecretLabel::ExporterSecret,
            "CLIENT_TRAFFIC_SECRET_" => SecretLabel::ClientTrafficSecret,
            "SERVER_TRAFFIC_SECRET_" => SecretLabel::ServerTrafficSecret,
            _ => return None,
        };
        Some(label)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            SecretLabel::ClientRandom => "master secret",
            SecretLabel::ClientHandshakeTrafficSecret => "client handshake traffic secret",
            SecretLabel::ServerHandshakeTrafficSecret => "server handshake traffic secret",
            SecretLabel::ExporterSecret => "exporter secret",
            SecretLabel::ClientTrafficSecret => "client traffic secret",
            SecretLabel::ServerTrafficSecret => "server traffic secret",
        }
    }
}

impl fmt::Display for SecretLabel {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.pad(self.describe())
    }
}
