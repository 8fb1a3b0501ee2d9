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
 * Note:
 *   vendor frame layouts reverse engineered from PLC-modem diagnostic
 *   captures, two incompatible firmware generations are in the field
 */

use crate::prelude::*;
use std::fmt;

// Vendor CP status frames piggyback on HomePlug AV management frames.
// Both generations share the outer MME header:
// |MMV|MMTYPE|FMI|FMSN|OUI|...vendor payload...|
// MMV    [1 byte]  : management message version
// MMTYPE [2 bytes] : management message type, little endian, vendor range
// FMI    [1 byte]  : fragmentation management information
// FMSN   [1 byte]  : fragmentation message sequence number
// OUI    [3 bytes] : vendor identifier, network byte order
// The (MMTYPE,OUI) pair selects the payload layout; the pairs are disjoint
// by construction so detection needs no further sniffing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VendorLayout {
    Vendor1,
    Vendor2,
}

// closed detection table, avoids string compares in the per-packet path
const LAYOUT_TABLE: [(u16, u32, VendorLayout); 2] = [
    (VENDOR1_TYPE_TAG, VENDOR1_OUI, VendorLayout::Vendor1),
    (VENDOR2_TYPE_TAG, VENDOR2_OUI, VendorLayout::Vendor2),
];

impl VendorLayout {
    // minimal buffer length covering the layout's last field
    pub fn field_span(&self) -> usize {
        match self {
            VendorLayout::Vendor1 => 15,
            VendorLayout::Vendor2 => 19,
        }
    }
}

// Explicit change tracking is only present in the Vendor1 layout: one byte
// where bit0 marks a frequency change, bit1 a duty-cycle change and bit2 a
// voltage change since the previous report. Vendor2 dropped the byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeFlags {
    pub frequency: bool,
    pub duty_cycle: bool,
    pub voltage: bool,
}

impl ChangeFlags {
    pub fn from_mask(mask: u8) -> ChangeFlags {
        ChangeFlags {
            frequency: mask & 0x01 != 0,
            duty_cycle: mask & 0x02 != 0,
            voltage: mask & 0x04 != 0,
        }
    }

    pub fn any(&self) -> bool {
        self.frequency || self.duty_cycle || self.voltage
    }
}

impl fmt::Display for ChangeFlags {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.frequency {
            parts.push("frequency");
        }
        if self.duty_cycle {
            parts.push("duty-cycle");
        }
        if self.voltage {
            parts.push("voltage");
        }
        fmt.pad(&parts.join(","))
    }
}

// One CP measurement as reported by the PLC modem. Built fresh for every
// frame and handed straight to the classifier, never stored. Out-of-range
// measurements are kept as-is so the host can display what was actually
// on the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CpFrame {
    pub frequency: i32,            // PWM oscillator, Hz
    pub duty_cycle: f64,           // percentage
    pub voltage: f64,              // volts
    pub changes: Option<ChangeFlags>, // None when the layout has no tracking
}

impl fmt::Display for CpFrame {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = format!(
            "CpFrame:{{ freq:{}Hz, duty:{:.1}%, voltage:{:.3}V }}",
            self.frequency, self.duty_cycle, self.voltage
        );
        fmt.pad(&text)
    }
}

fn read_i16_le(buf: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([buf[offset], buf[offset + 1]])
}

// Detect which vendor layout applies by reading the MMTYPE little endian
// at offset 1 and the OUI in network order at offset 5. Unknown pairs mean
// the frame belongs to another dissector, not an error.
pub fn identify_vendor(buf: &[u8]) -> Option<VendorLayout> {
    if buf.len() < HPAV_VENDOR_TAG_OFFSET + 3 {
        return None;
    }
    let type_tag = u16::from_le_bytes([buf[HPAV_TYPE_TAG_OFFSET], buf[HPAV_TYPE_TAG_OFFSET + 1]]);
    let oui = u32::from(buf[HPAV_VENDOR_TAG_OFFSET]) << 16
        | u32::from(buf[HPAV_VENDOR_TAG_OFFSET + 1]) << 8
        | u32::from(buf[HPAV_VENDOR_TAG_OFFSET + 2]);

    LAYOUT_TABLE
        .iter()
        .find(|(tag, vendor, _)| *tag == type_tag && *vendor == oui)
        .map(|(_, _, layout)| *layout)
}

// Extract the CP measurement fields for the detected layout.
//
// Vendor1 payload:
// |CHANGE|FREQ|DUTY|VOLT|
// CHANGE [1 byte]  offset 8  : change-flag mask, see ChangeFlags
// FREQ   [2 bytes] offset 9  : PWM frequency, Hz, signed little endian
// DUTY   [2 bytes] offset 11 : duty cycle, tenths of a percent, signed LE
// VOLT   [2 bytes] offset 13 : positive peak voltage, mV, signed LE
//
// Vendor2 payload:
// |DUTY|FREQ|VOLT|
// DUTY   [1 byte]  offset 14 : duty cycle, whole percent, signed
// FREQ   [2 bytes] offset 15 : PWM frequency, Hz, signed little endian
// VOLT   [2 bytes] offset 17 : positive peak voltage, mV, signed LE
//
// Returns None when the buffer stops short of the layout's field span, the
// decoder never pads missing bytes.
pub fn extract_frame(buf: &[u8], layout: VendorLayout) -> Option<CpFrame> {
    if buf.len() < layout.field_span() {
        log::debug!(
            "cp-frame truncated: {} bytes, layout {:?} needs {}",
            buf.len(),
            layout,
            layout.field_span()
        );
        return None;
    }

    let frame = match layout {
        VendorLayout::Vendor1 => CpFrame {
            frequency: read_i16_le(buf, 9) as i32,
            duty_cycle: read_i16_le(buf, 11) as f64 / 10.0,
            voltage: read_i16_le(buf, 13) as f64 / 1000.0,
            changes: Some(ChangeFlags::from_mask(buf[8])),
        },
        VendorLayout::Vendor2 => CpFrame {
            frequency: read_i16_le(buf, 15) as i32,
            duty_cycle: buf[14] as i8 as f64,
            voltage: read_i16_le(buf, 17) as f64 / 1000.0,
            changes: None,
        },
    };
    Some(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor1_header() -> Vec<u8> {
        let mut buf = vec![0u8; HPAV_VENDOR_FRAME_LEN];
        buf[1] = 0x0E; // MMTYPE LE
        buf[2] = 0xA1;
        buf[5] = 0x00; // OUI network order
        buf[6] = 0x13;
        buf[7] = 0xD7;
        buf
    }

    fn vendor2_header() -> Vec<u8> {
        let mut buf = vec![0u8; HPAV_VENDOR_FRAME_LEN];
        buf[1] = 0x2E;
        buf[2] = 0xA2;
        buf[5] = 0x00;
        buf[6] = 0x80;
        buf[7] = 0xE1;
        buf
    }

    #[test]
    fn detect_both_layouts() {
        assert_eq!(identify_vendor(&vendor1_header()), Some(VendorLayout::Vendor1));
        assert_eq!(identify_vendor(&vendor2_header()), Some(VendorLayout::Vendor2));
    }

    #[test]
    fn reject_near_miss_tags() {
        // Vendor1 MMTYPE with Vendor2 OUI is not a known pair
        let mut buf = vendor1_header();
        buf[6] = 0x80;
        buf[7] = 0xE1;
        assert_eq!(identify_vendor(&buf), None);

        let mut buf = vendor2_header();
        buf[2] = 0xA1;
        assert_eq!(identify_vendor(&buf), None);
    }

    #[test]
    fn reject_short_header() {
        assert_eq!(identify_vendor(&[0u8; 7]), None);
        assert_eq!(identify_vendor(&[]), None);
    }

    #[test]
    fn vendor1_field_extraction() {
        let mut buf = vendor1_header();
        buf[8] = 0x05; // frequency + voltage changed
        buf[9..11].copy_from_slice(&1000i16.to_le_bytes());
        buf[11..13].copy_from_slice(&535i16.to_le_bytes()); // 53.5%
        buf[13..15].copy_from_slice(&8950i16.to_le_bytes()); // 8.950V

        let frame = extract_frame(&buf, VendorLayout::Vendor1).unwrap();
        assert_eq!(frame.frequency, 1000);
        assert_eq!(frame.duty_cycle, 53.5);
        assert_eq!(frame.voltage, 8.95);
        let changes = frame.changes.unwrap();
        assert!(changes.frequency && changes.voltage && !changes.duty_cycle);
    }

    #[test]
    fn vendor1_change_mask_meaning() {
        for mask in 0u8..8 {
            let flags = ChangeFlags::from_mask(mask);
            assert_eq!(flags.frequency, mask & 1 != 0);
            assert_eq!(flags.duty_cycle, mask & 2 != 0);
            assert_eq!(flags.voltage, mask & 4 != 0);
        }
        assert!(!ChangeFlags::from_mask(0).any());
        assert_eq!(ChangeFlags::from_mask(3).to_string(), "frequency,duty-cycle");
    }

    #[test]
    fn vendor2_field_extraction() {
        let mut buf = vendor2_header();
        buf[14] = 50; // whole percent, no scaling
        buf[15..17].copy_from_slice(&997i16.to_le_bytes());
        buf[17..19].copy_from_slice(&6120i16.to_le_bytes());

        let frame = extract_frame(&buf, VendorLayout::Vendor2).unwrap();
        assert_eq!(frame.frequency, 997);
        assert_eq!(frame.duty_cycle, 50.0);
        assert_eq!(frame.voltage, 6.12);
        assert!(frame.changes.is_none());
    }

    #[test]
    fn vendor2_negative_duty_preserved() {
        let mut buf = vendor2_header();
        buf[14] = (-5i8) as u8;
        let frame = extract_frame(&buf, VendorLayout::Vendor2).unwrap();
        assert_eq!(frame.duty_cycle, -5.0);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let buf = vendor1_header();
        assert!(extract_frame(&buf[..14], VendorLayout::Vendor1).is_none());
        assert!(extract_frame(&buf[..18], VendorLayout::Vendor2).is_none());
        assert!(extract_frame(&buf[..15], VendorLayout::Vendor1).is_some());
    }
}
