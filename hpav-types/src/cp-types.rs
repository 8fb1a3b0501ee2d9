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
use serde::{Deserialize, Serialize};
use std::fmt;

// Control pilot states as defined by IEC 61851-1 Annex A. The letter gives
// the voltage band measured on the pilot line, the digit tells whether the
// EVSE applies a PWM oscillation (2) or holds a steady level (1). E/F covers
// both error states, they cannot be told apart from band measurements alone.
#[allow(non_camel_case_types)]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CpState {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    D1,
    D2,
    EF,
    UNDEFINED,
}

impl CpState {
    // numeric series used by plotting frontends, one slot per state
    pub fn ordinal(&self) -> i32 {
        match self {
            CpState::A1 => 1,
            CpState::A2 => 2,
            CpState::B1 => 3,
            CpState::B2 => 4,
            CpState::C1 => 5,
            CpState::C2 => 6,
            CpState::D1 => 7,
            CpState::D2 => 8,
            CpState::EF => -1,
            CpState::UNDEFINED => 0,
        }
    }
}

impl fmt::Display for CpState {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CpState::A1 => "A1",
            CpState::A2 => "A2",
            CpState::B1 => "B1",
            CpState::B2 => "B2",
            CpState::C1 => "C1",
            CpState::C2 => "C2",
            CpState::D1 => "D1",
            CpState::D2 => "D2",
            CpState::EF => "E/F",
            CpState::UNDEFINED => "-",
        };
        fmt.pad(text)
    }
}
