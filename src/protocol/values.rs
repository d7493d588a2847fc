//! # Register Value Decoders
//!
//! Maps raw register bytes to physical values and builds [`Event`]s.
//!
//! | Register set | Decoder | Rejects |
//! |--------------|---------|---------|
//! | Fan speed | sentinel table, speed 1-8 | any non-sentinel byte |
//! | Temperatures (both generations) | 256-entry lookup table | never |
//! | Relative humidity | `(raw - 51) / 2.04`, rounded | raw below 0x33 |
//! | CO2 high / low byte | two-byte correlation | high byte always, stale pairs |
//!
//! Registers without a decoder pass their raw byte through unchanged.
//! A rejected value suppresses the event for that packet entirely.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{Duration, Instant};

use super::constants::*;
use super::packet::Packet;

/// Window in which both CO2 halves must have been observed
pub const CO2_WINDOW: Duration = Duration::from_millis(500);

/// Raw fan speed values for speeds 1 through 8
const FAN_SPEED_VALUES: [u8; 8] = [0x01, 0x03, 0x07, 0x0f, 0x1f, 0x3f, 0x7f, 0xff];

/// Lowest raw byte a humidity sensor reports
const RH_RAW_MIN: u8 = 0x33;

/// NTC lookup from raw byte to degrees Celsius
#[rustfmt::skip]
const TEMPERATURE_TABLE: [i16; 256] = [
    -74, -70, -66, -62, -59, -56, -54, -52, -50, -48, -47, -46, -44, -43, -42, -41,
    -40, -39, -38, -37, -36, -35, -34, -33, -33, -32, -31, -30, -30, -29, -28, -28,
    -27, -27, -26, -25, -25, -24, -24, -23, -23, -22, -22, -21, -21, -20, -20, -19,
    -19, -19, -18, -18, -17, -17, -16, -16, -16, -15, -15, -14, -14, -14, -13, -13,
    -12, -12, -12, -11, -11, -11, -10, -10, -9, -9, -9, -8, -8, -8, -7, -7,
    -7, -6, -6, -6, -5, -5, -5, -4, -4, -4, -3, -3, -3, -2, -2, -2,
    -1, -1, -1, -1, 0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3,
    4, 4, 4, 5, 5, 5, 5, 6, 6, 6, 7, 7, 7, 8, 8, 8,
    9, 9, 9, 10, 10, 10, 11, 11, 11, 12, 12, 12, 13, 13, 13, 14,
    14, 14, 15, 15, 15, 16, 16, 16, 17, 17, 18, 18, 18, 19, 19, 19,
    20, 20, 21, 21, 21, 22, 22, 22, 23, 23, 24, 24, 24, 25, 25, 26,
    26, 27, 27, 27, 28, 28, 29, 29, 30, 30, 31, 31, 32, 32, 33, 33,
    34, 34, 35, 35, 36, 36, 37, 37, 38, 38, 39, 40, 40, 41, 41, 42,
    43, 43, 44, 45, 45, 46, 47, 48, 48, 49, 50, 51, 52, 53, 53, 54,
    55, 56, 57, 59, 60, 61, 62, 63, 65, 66, 68, 69, 71, 73, 75, 77,
    79, 81, 82, 86, 90, 93, 97, 100, 100, 100, 100, 100, 100, 100, 100, 100,
];

/// Outcome of decoding a register byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Physical value to publish
    Value(i16),
    /// Not a valid reading; no event is emitted
    Rejected,
}

impl Decoded {
    pub fn value(self) -> Option<i16> {
        match self {
            Decoded::Value(value) => Some(value),
            Decoded::Rejected => None,
        }
    }
}

/// Decoded reading from the bus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// When the packet was decoded
    pub time: DateTime<Utc>,
    /// Bus address of the sender
    pub source: u8,
    /// Bus address of the recipient
    pub destination: u8,
    /// Register the value belongs to
    pub register: u8,
    /// Byte as it appeared on the wire
    #[serde(rename = "raw")]
    pub raw_value: u8,
    /// Decoded physical value
    pub value: i16,
}

/// Decode a fan speed sentinel into speed 1-8
pub fn value_to_speed(raw: u8) -> Decoded {
    FAN_SPEED_VALUES
        .iter()
        .position(|&v| v == raw)
        .map_or(Decoded::Rejected, |index| Decoded::Value(index as i16 + 1))
}

/// Encode speed 1-8 into its sentinel, `None` outside that range
pub fn speed_to_value(speed: u8) -> Option<u8> {
    let index = usize::from(speed).checked_sub(1)?;
    FAN_SPEED_VALUES.get(index).copied()
}

/// Look up a temperature; total over all raw bytes
pub fn value_to_temp(raw: u8) -> i16 {
    TEMPERATURE_TABLE[usize::from(raw)]
}

/// Convert a humidity byte into percent
pub fn value_to_rh(raw: u8) -> Decoded {
    if raw < RH_RAW_MIN {
        return Decoded::Rejected;
    }
    let percent = ((f32::from(raw) - 51.0) / 2.04).round();
    Decoded::Value(percent as i16)
}

#[derive(Debug, Clone, Copy)]
struct ByteReading {
    value: u8,
    at: Instant,
}

/// Pairs the two independently broadcast CO2 bytes
///
/// Only the most recent observation of each half is kept. A combined value
/// is published only when the low byte arrives while both halves are younger
/// than [`CO2_WINDOW`] and the combined value is positive.
#[derive(Debug, Default)]
pub struct Co2Correlator {
    high: Option<ByteReading>,
    low: Option<ByteReading>,
}

impl Co2Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the high byte; one half alone never yields a value
    pub fn observe_high(&mut self, value: u8, now: Instant) -> Decoded {
        self.high = Some(ByteReading { value, at: now });
        Decoded::Rejected
    }

    /// Record the low byte and evaluate the pair
    pub fn observe_low(&mut self, value: u8, now: Instant) -> Decoded {
        self.low = Some(ByteReading { value, at: now });
        self.combined(now)
    }

    fn combined(&self, now: Instant) -> Decoded {
        let (Some(high), Some(low)) = (self.high, self.low) else {
            return Decoded::Rejected;
        };

        let fresh = |reading: ByteReading| now.saturating_duration_since(reading.at) < CO2_WINDOW;
        if !fresh(high) || !fresh(low) {
            return Decoded::Rejected;
        }

        match i16::from_be_bytes([high.value, low.value]) {
            value if value > 0 => Decoded::Value(value),
            _ => Decoded::Rejected,
        }
    }
}

/// Which conversion a register goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    FanSpeed,
    Temperature,
    Humidity,
    Co2High,
    Co2Low,
}

impl RegisterKind {
    /// Decoder for a register, `None` for pass-through registers
    pub fn for_register(register: u8) -> Option<Self> {
        match register {
            FAN_SPEED => Some(Self::FanSpeed),
            TEMP_INCOMING_OUTSIDE | TEMP_OUTGOING_INSIDE | TEMP_INCOMING_INSIDE
            | TEMP_OUTGOING_OUTSIDE | TEMP_INCOMING_OUTSIDE_NEW | TEMP_OUTGOING_OUTSIDE_NEW
            | TEMP_OUTGOING_INSIDE_NEW | TEMP_INCOMING_INSIDE_NEW => Some(Self::Temperature),
            RH_HIGHEST | RH1 | RH2 => Some(Self::Humidity),
            CO2_HIGHEST_HIGH_BYTE => Some(Self::Co2High),
            CO2_HIGHEST_LOW_BYTE => Some(Self::Co2Low),
            _ => None,
        }
    }
}

/// Stateful decoder owned by the receive loop
#[derive(Debug, Default)]
pub struct ValueDecoder {
    co2: Co2Correlator,
}

impl ValueDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw register byte observed at `now`
    pub fn decode(&mut self, register: u8, raw: u8, now: Instant) -> Decoded {
        match RegisterKind::for_register(register) {
            Some(RegisterKind::FanSpeed) => value_to_speed(raw),
            Some(RegisterKind::Temperature) => Decoded::Value(value_to_temp(raw)),
            Some(RegisterKind::Humidity) => value_to_rh(raw),
            Some(RegisterKind::Co2High) => self.co2.observe_high(raw, now),
            Some(RegisterKind::Co2Low) => self.co2.observe_low(raw, now),
            None => Decoded::Value(i16::from(raw)),
        }
    }

    /// Turn a packet into an event, `None` when its value is rejected
    pub fn event(&mut self, packet: &Packet, now: Instant, time: DateTime<Utc>) -> Option<Event> {
        let value = self.decode(packet.register(), packet.value(), now).value()?;
        Some(Event {
            time,
            source: packet.source(),
            destination: packet.destination(),
            register: packet.register(),
            raw_value: packet.value(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_endpoints() {
        assert_eq!(value_to_temp(0), -74);
        assert_eq!(value_to_temp(255), 100);
        assert_eq!(value_to_temp(246), 97);
        assert_eq!(value_to_temp(247), 100);
    }

    #[test]
    fn test_temperature_table_is_monotonic() {
        for raw in 1..=255u8 {
            assert!(value_to_temp(raw) >= value_to_temp(raw - 1), "raw {raw}");
        }
    }

    #[test]
    fn test_fan_speed_round_trip() {
        for speed in 1..=8u8 {
            let raw = speed_to_value(speed).expect("speed in range");
            assert_eq!(value_to_speed(raw), Decoded::Value(i16::from(speed)));
        }
        assert_eq!(speed_to_value(1), Some(0x01));
        assert_eq!(speed_to_value(4), Some(0x0f));
        assert_eq!(speed_to_value(8), Some(0xff));
    }

    #[test]
    fn test_fan_speed_rejects_non_sentinels() {
        for raw in 0..=255u8 {
            if !FAN_SPEED_VALUES.contains(&raw) {
                assert_eq!(value_to_speed(raw), Decoded::Rejected, "raw 0x{raw:02x}");
            }
        }
    }

    #[test]
    fn test_speed_to_value_out_of_range() {
        assert_eq!(speed_to_value(0), None);
        assert_eq!(speed_to_value(9), None);
        assert_eq!(speed_to_value(255), None);
    }

    #[test]
    fn test_humidity() {
        assert_eq!(value_to_rh(0x32), Decoded::Rejected);
        assert_eq!(value_to_rh(0x00), Decoded::Rejected);
        assert_eq!(value_to_rh(0x33), Decoded::Value(0));
        assert_eq!(value_to_rh(0x99), Decoded::Value(50));
        assert_eq!(value_to_rh(0xff), Decoded::Value(100));
    }

    #[test]
    fn test_co2_pair_within_window() {
        let t0 = Instant::now();
        let mut co2 = Co2Correlator::new();
        assert_eq!(co2.observe_high(1, t0), Decoded::Rejected);
        let value = co2.observe_low(0xf4, t0 + Duration::from_millis(10));
        assert_eq!(value, Decoded::Value(0x1f4));
    }

    #[test]
    fn test_co2_high_alone_never_emits() {
        let t0 = Instant::now();
        let mut co2 = Co2Correlator::new();
        assert_eq!(co2.observe_low(0xf4, t0), Decoded::Rejected);
        assert_eq!(co2.observe_high(1, t0 + Duration::from_millis(5)), Decoded::Rejected);
    }

    #[test]
    fn test_co2_low_before_high_pairs_on_next_low() {
        let t0 = Instant::now();
        let mut co2 = Co2Correlator::new();
        co2.observe_low(0x10, t0);
        co2.observe_high(0x02, t0 + Duration::from_millis(100));
        let value = co2.observe_low(0x20, t0 + Duration::from_millis(200));
        assert_eq!(value, Decoded::Value(0x0220));
    }

    #[test]
    fn test_co2_stale_high_rejected() {
        let t0 = Instant::now();
        let mut co2 = Co2Correlator::new();
        co2.observe_high(1, t0);
        assert_eq!(co2.observe_low(0xf4, t0 + CO2_WINDOW), Decoded::Rejected);
        assert_eq!(
            co2.observe_low(0xf4, t0 + Duration::from_millis(600)),
            Decoded::Rejected
        );
    }

    #[test]
    fn test_co2_non_positive_rejected() {
        let t0 = Instant::now();
        let mut co2 = Co2Correlator::new();
        co2.observe_high(0, t0);
        assert_eq!(co2.observe_low(0, t0), Decoded::Rejected);
        co2.observe_high(0x80, t0);
        assert_eq!(co2.observe_low(0x01, t0), Decoded::Rejected);
    }

    #[test]
    fn test_register_kinds() {
        assert_eq!(RegisterKind::for_register(FAN_SPEED), Some(RegisterKind::FanSpeed));
        for register in [
            TEMP_INCOMING_OUTSIDE,
            TEMP_OUTGOING_INSIDE,
            TEMP_INCOMING_INSIDE,
            TEMP_OUTGOING_OUTSIDE,
            TEMP_INCOMING_OUTSIDE_NEW,
            TEMP_OUTGOING_OUTSIDE_NEW,
            TEMP_OUTGOING_INSIDE_NEW,
            TEMP_INCOMING_INSIDE_NEW,
        ] {
            assert_eq!(RegisterKind::for_register(register), Some(RegisterKind::Temperature));
        }
        for register in [RH_HIGHEST, RH1, RH2] {
            assert_eq!(RegisterKind::for_register(register), Some(RegisterKind::Humidity));
        }
        assert_eq!(RegisterKind::for_register(0x71), None);
    }

    #[test]
    fn test_unknown_register_passes_raw_through() {
        let mut decoder = ValueDecoder::new();
        assert_eq!(decoder.decode(0x71, 0xc8, Instant::now()), Decoded::Value(200));
    }

    #[test]
    fn test_event_from_packet() {
        let mut decoder = ValueDecoder::new();
        let packet = Packet::new(DEVICE_MAIN, REMOTE_CLIENT_MULTICAST, FAN_SPEED, 0x07);
        let time = Utc::now();

        let event = decoder.event(&packet, Instant::now(), time).expect("event");
        assert_eq!(event.time, time);
        assert_eq!(event.source, DEVICE_MAIN);
        assert_eq!(event.destination, REMOTE_CLIENT_MULTICAST);
        assert_eq!(event.register, FAN_SPEED);
        assert_eq!(event.raw_value, 0x07);
        assert_eq!(event.value, 3);
    }

    #[test]
    fn test_rejected_value_yields_no_event() {
        let mut decoder = ValueDecoder::new();
        let packet = Packet::new(DEVICE_MAIN, REMOTE_CLIENT_MULTICAST, FAN_SPEED, 0x02);
        assert!(decoder.event(&packet, Instant::now(), Utc::now()).is_none());
    }

    #[test]
    fn test_co2_event_reports_low_register() {
        let mut decoder = ValueDecoder::new();
        let now = Instant::now();
        let high = Packet::new(DEVICE_MAIN, REMOTE_CLIENT_MULTICAST, CO2_HIGHEST_HIGH_BYTE, 1);
        let low = Packet::new(DEVICE_MAIN, REMOTE_CLIENT_MULTICAST, CO2_HIGHEST_LOW_BYTE, 0xf4);

        assert!(decoder.event(&high, now, Utc::now()).is_none());
        let event = decoder.event(&low, now, Utc::now()).expect("co2 event");
        assert_eq!(event.value, 0x1f4);
        assert_eq!(event.register, CO2_HIGHEST_LOW_BYTE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_co2_delayed_low_byte_rejected() {
        let mut decoder = ValueDecoder::new();
        let high = Packet::new(DEVICE_MAIN, REMOTE_CLIENT_MULTICAST, CO2_HIGHEST_HIGH_BYTE, 1);
        let low = Packet::new(DEVICE_MAIN, REMOTE_CLIENT_MULTICAST, CO2_HIGHEST_LOW_BYTE, 0xf4);

        assert!(decoder.event(&high, Instant::now(), Utc::now()).is_none());
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(decoder.event(&low, Instant::now(), Utc::now()).is_none());
    }

    #[test]
    fn test_event_serializes_with_raw_field() {
        let event = Event {
            time: Utc::now(),
            source: 0x11,
            destination: 0x20,
            register: RH1,
            raw_value: 0x99,
            value: 50,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["raw"], 0x99);
        assert_eq!(json["value"], 50);
        assert_eq!(json["register"], RH1);
        assert!(json.get("raw_value").is_none());
    }
}
