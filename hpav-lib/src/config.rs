/*
 * Copyright (C) 2015-2022 IoT.bzh Company
 * Author: Fulup Ar Foll <fulup@iot.bzh>
 *
 * Licensed under the Apache License; Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing; software
 * distributed under the License is distributed on an "AS IS" BASIS;
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND; either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 * Reference:
 *   IEC 61851-1 Annex A (control pilot bands and ampacity)
 *   ISO 15118-3 (V2G over HomePlug GreenPHY)
 *
 * Note:
 *  static values taken from vendor PLC-modem firmware captures; the two
 *  layouts below come from incompatible firmware generations observed in
 *  the field and cannot be merged.
 */

use std::path::PathBuf;

// Every vendor CP status frame rides a fixed-size 60 byte HomePlug AV MME,
// padded with zeros past the last meaningful field. The dissector always
// consumes the full MME whatever the detected layout.
pub const HPAV_VENDOR_FRAME_LEN: usize = 60;

// HomePlug AV MMTYPE field, 2 bytes little endian at offset 1 of the MME
// (offset 0 carries the MMV protocol version byte).
pub const HPAV_TYPE_TAG_OFFSET: usize = 1;

// Vendor OUI, 3 bytes transmitted in network order at offset 5, directly
// after the MMTYPE and the 2 byte fragmentation field.
pub const HPAV_VENDOR_TAG_OFFSET: usize = 5;

// First firmware generation: explicit change-flag byte, all measurements
// scaled little-endian 16 bit words at offsets 8..14.
pub const VENDOR1_TYPE_TAG: u16 = 0xA10E;
pub const VENDOR1_OUI: u32 = 0x0013D7;

// Second firmware generation: no change tracking, duty cycle squeezed into
// a single signed byte, fields at offsets 14..18.
pub const VENDOR2_TYPE_TAG: u16 = 0xA22E;
pub const VENDOR2_OUI: u32 = 0x0080E1;

//  IEC 61851-1 Annex A: the EVSE reads the CP line voltage to derive the
//  vehicle state. Nominal levels are spaced 3V apart; measurements are
//  accepted within +/-1V of the nominal value, which keeps the bands
//  disjoint except at the exact midpoints where the higher band wins.
pub const CP_NOMINAL_A: f64 = 12.0; // no vehicle
pub const CP_NOMINAL_B: f64 = 9.0; // vehicle connected, not ready
pub const CP_NOMINAL_C: f64 = 6.0; // vehicle ready, charging allowed
pub const CP_NOMINAL_D: f64 = 3.0; // vehicle ready, ventilation required
pub const CP_BAND_TOLERANCE: f64 = 1.0;

// CP PWM runs at a nominal 1 kHz; a measured oscillator within this window
// marks the "2" (PWM active) sub-state.
pub const CP_PWM_FREQ_MIN_HZ: i32 = 950;
pub const CP_PWM_FREQ_MAX_HZ: i32 = 1050;

// Plausibility bounds for raw measurements. The pilot line physically swings
// between -12V and +12V; anything far outside is a corrupt frame, not a
// measurement. Duty cycle is a percentage by definition.
pub const CP_VOLTAGE_PLAUSIBLE: f64 = 50.0;
pub const CP_DUTY_MIN: f64 = 0.0;
pub const CP_DUTY_MAX: f64 = 100.0;

//  IEC 61851-1 table A.8 ampacity breakpoints: duty cycle announced by the
//  EVSE encodes the maximum current the vehicle may draw.
//    below 8%          -> no current may be drawn
//    8% to 10%         -> 6A fixed
//    10% to 85%        -> duty * 0.6 A
//    85% to 96%        -> (duty - 64) * 2.5 A
//    96% to 97%        -> 80A fixed
//    97% and above     -> no current may be drawn
pub const CP_DUTY_NO_CURRENT_LOW: f64 = 8.0;
pub const CP_DUTY_FIXED_6A: f64 = 10.0;
pub const CP_DUTY_LINEAR_END: f64 = 85.0;
pub const CP_DUTY_STEEP_END: f64 = 96.0;
pub const CP_DUTY_NO_CURRENT_HIGH: f64 = 97.0;

// NSS key-log lines carry label + 64 hex chars of client random + the secret
// in hex; real lines land well inside this window, anything outside is either
// truncation or an unrelated text line that happened to match the grammar.
pub const KEYLOG_LINE_MIN_LEN: usize = 100;
pub const KEYLOG_LINE_MAX_LEN: usize = 300;

// File name of the shared key-log store inside the platform temp directory;
// the path may be overridden through the host configuration port.
pub const KEYLOG_DEFAULT_FILE: &str = "v2g-keylog.txt";

// First host release exposing both the key-log preference and the decoded
// traffic reload trigger; older hosts get the parsed info but no persistence.
pub const HOST_VERSION_MIN: (u32, u32, u32) = (3, 5, 0);

// default store location, cheap to compute so derived on demand
pub fn keylog_default_path() -> PathBuf {
    std::env::temp_dir().join(KEYLOG_DEFAULT_FILE)
}
