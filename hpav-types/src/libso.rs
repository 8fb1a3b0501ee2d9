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
 */

#[path = "cp-types.rs"]
mod cp;

#[path = "tls-types.rs"]
mod tls;

pub mod prelude {
    pub use crate::cp::*;
    pub use crate::tls::*;
}
