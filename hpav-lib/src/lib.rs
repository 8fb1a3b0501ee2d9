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
 *   IEC 61851-1 Annex A (control pilot)
 *   ISO 15118-3 (V2G over HomePlug GreenPHY)
 *   https://www.ietf.org/archive/id/draft-thomson-tls-keylogfile-00.html
 */

#![doc(
    html_logo_url = "https://iot.bzh/images/defaults/company/512-479-max-transp.png",
    html_favicon_url = "https://iot.bzh/images/defaults/favicon.ico"
)]

#[path = "config.rs"]
mod conf;

#[path = "messages.rs"]
mod msg;

#[path = "pilot.rs"]
mod pilot;

#[path = "env.rs"]
mod env;

#[path = "keylog.rs"]
mod keylog;

// export to external crate restricted to decoder APIs
pub mod prelude {
    pub use crate::conf::*;
    pub use crate::env::*;
    pub use crate::keylog::*;
    pub use crate::msg::*;
    pub use crate::pilot::*;
    pub use typesv2g::prelude::*;
}
