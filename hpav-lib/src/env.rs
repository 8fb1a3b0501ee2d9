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
 */

use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Note,
    Warning,
}

// Capabilities the hosting dissector environment provides to the decoders.
// Injected at call time so the decoding logic stays testable without a host;
// the production adapter wraps the real capture environment.
pub trait HostEnv {
    // host release as a three part version tuple
    fn version(&self) -> (u32, u32, u32);

    // configured key-log store path, None selects the built-in default
    fn keylog_path(&self) -> Option<PathBuf>;

    // severity tagged annotation attached to the current packet tree
    fn add_annotation(&mut self, severity: Severity, message: &str);

    // info column of the current packet
    fn set_info(&mut self, text: &str);
    fn append_info(&mut self, text: &str);

    // ask the host to re-dissect already decoded traffic once new key
    // material is available
    fn reload_keys(&mut self);
}

// component wise comparison against the minimum supported host release
pub fn version_supported(version: (u32, u32, u32), floor: (u32, u32, u32)) -> bool {
    version >= floor
}
