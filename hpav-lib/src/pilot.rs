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
 *   IEC 61851-1 Annex A (control pilot states and ampacity table)
 */

use crate::prelude::*;

// One fully decoded vendor CP status frame, ready for annotation by the
// hosting dissector. consumed is always the full MME length whatever the
// layout, the tail bytes are padding.
#[derive(Clone, Copy, Debug)]
pub struct CpReading {
    pub consumed: usize,
    pub layout: VendorLayout,
    pub frame: CpFrame,
    pub state: CpState,
    pub max_current: Option<f64>, // amps, None when no current may be drawn
}

// Classify a measurement into an IEC 61851-1 state.
//
// Bands are checked highest voltage first; with 3V nominal spacing and 1V
// tolerance they only touch at exact midpoints, where the higher band wins.
// A duty cycle pinned at exactly 0% or 100% while the oscillator still runs
// is a transient between two stable levels and cannot be classified.
// Out-of-range measurements (duty outside 0..100, voltage beyond any
// plausible pilot level) are corrupt frames and classify as undefined.
pub fn classify(frame: &CpFrame) -> CpState {
    let duty = frame.duty_cycle;
    let volt = frame.voltage;

    if duty < CP_DUTY_MIN || duty > CP_DUTY_MAX || volt.abs() > CP_VOLTAGE_PLAUSIBLE {
        return CpState::UNDEFINED;
    }

    if (duty == CP_DUTY_MIN || duty == CP_DUTY_MAX) && frame.frequency > 0 {
        return CpState::UNDEFINED;
    }

    // PWM active: oscillator inside the 1kHz window with a real duty cycle
    let pwm = duty > CP_DUTY_MIN
        && duty < CP_DUTY_MAX
        && frame.frequency > CP_PWM_FREQ_MIN_HZ
        && frame.frequency < CP_PWM_FREQ_MAX_HZ;

    if (volt - CP_NOMINAL_A).abs() <= CP_BAND_TOLERANCE {
        if pwm {
            CpState::A2
        } else {
            CpState::A1
        }
    } else if (volt - CP_NOMINAL_B).abs() <= CP_BAND_TOLERANCE {
        if pwm {
            CpState::B2
        } else {
            CpState::B1
        }
    } else if (volt - CP_NOMINAL_C).abs() <= CP_BAND_TOLERANCE {
        if pwm {
            CpState::C2
        } else {
            CpState::C1
        }
    } else if (volt - CP_NOMINAL_D).abs() <= CP_BAND_TOLERANCE {
        if pwm {
            CpState::D2
        } else {
            CpState::D1
        }
    } else if volt <= CP_BAND_TOLERANCE {
        CpState::EF
    } else {
        CpState::UNDEFINED
    }
}

// IEC 61851-1 table A.8: maximum current the vehicle may draw for a given
// announced duty cycle. None means no current may be drawn, either because
// the EVSE forbids it or because the duty cycle is outside the table.
pub fn max_current(duty: f64) -> Option<f64> {
    if duty < CP_DUTY_NO_CURRENT_LOW {
        None
    } else if duty < CP_DUTY_FIXED_6A {
        Some(6.0)
    } else if duty < CP_DUTY_LINEAR_END {
        Some(duty * 0.6)
    } else if duty < CP_DUTY_STEEP_END {
        Some((duty - 64.0) * 2.5)
    } else if duty < CP_DUTY_NO_CURRENT_HIGH {
        Some(80.0)
    } else {
        None
    }
}

// Dispatcher entry for CP telemetry frames. None tells the dispatcher the
// buffer belongs to another handler; a reading consumes the fixed MME size.
pub fn decode(buf: &[u8]) -> Option<CpReading> {
    let layout = identify_vendor(buf)?;
    let frame = extract_frame(buf, layout)?;
    let state = classify(&frame);
    log::debug!("cp-telemetry {:?} {} -> {}", layout, frame, state);

    Some(CpReading {
        consumed: HPAV_VENDOR_FRAME_LEN,
        layout,
        frame,
        state,
        max_current: max_current(frame.duty_cycle),
    })
}
