//! # Vallox Bus Constants
//!
//! Bus addresses, known registers and frame layout of the Vallox RS485 protocol.

/// Frame length on the wire: system + source + destination + register + value + checksum
pub const PACKET_LEN: usize = 6;

/// System byte, constant for every frame on the bus
pub const SYSTEM: u8 = 0x01;

/// Multicast address for all ventilation units
pub const DEVICE_MULTICAST: u8 = 0x10;

/// Main ventilation unit
pub const DEVICE_MAIN: u8 = 0x11;

/// Multicast address for all remote controllers
pub const REMOTE_CLIENT_MULTICAST: u8 = 0x20;

/// Lowest address a remote client may use
pub const REMOTE_CLIENT_ID_MIN: u8 = 0x20;

/// Highest address a remote client may use
pub const REMOTE_CLIENT_ID_MAX: u8 = 0x2f;

/// Default address of this client on the bus
pub const DEFAULT_REMOTE_CLIENT_ID: u8 = 0x27;

/// Register 0 carries a query; the frame value names the queried register
pub const REGISTER_QUERY: u8 = 0x00;

/// Fan speed, readable and writable
pub const FAN_SPEED: u8 = 0x29;

// Temperatures broadcast by older units
/// Incoming air, outside
pub const TEMP_INCOMING_OUTSIDE: u8 = 0x58;
/// Outgoing air, inside
pub const TEMP_OUTGOING_INSIDE: u8 = 0x5a;
/// Incoming air, inside
pub const TEMP_INCOMING_INSIDE: u8 = 0x5b;
/// Outgoing air, outside
pub const TEMP_OUTGOING_OUTSIDE: u8 = 0x5c;

// Temperatures broadcast by newer units
/// Incoming air, outside
pub const TEMP_INCOMING_OUTSIDE_NEW: u8 = 0x32;
/// Outgoing air, outside
pub const TEMP_OUTGOING_OUTSIDE_NEW: u8 = 0x33;
/// Outgoing air, inside
pub const TEMP_OUTGOING_INSIDE_NEW: u8 = 0x34;
/// Incoming air, inside
pub const TEMP_INCOMING_INSIDE_NEW: u8 = 0x35;

/// Highest relative humidity of all sensors
pub const RH_HIGHEST: u8 = 0x2a;
/// CO2 reading, high byte
pub const CO2_HIGHEST_HIGH_BYTE: u8 = 0x2b;
/// CO2 reading, low byte
pub const CO2_HIGHEST_LOW_BYTE: u8 = 0x2c;
/// Relative humidity sensor 1
pub const RH1: u8 = 0x2f;
/// Relative humidity sensor 2
pub const RH2: u8 = 0x30;

/// Registers that may be written when writes are enabled
pub const WRITABLE_REGISTERS: &[u8] = &[FAN_SPEED];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_constants() {
        assert_eq!(DEVICE_MULTICAST, 0x10);
        assert_eq!(DEVICE_MAIN, 0x11);
        assert_eq!(REMOTE_CLIENT_MULTICAST, 0x20);
        assert!((REMOTE_CLIENT_ID_MIN..=REMOTE_CLIENT_ID_MAX).contains(&DEFAULT_REMOTE_CLIENT_ID));
    }

    #[test]
    fn test_only_fan_speed_is_writable() {
        assert_eq!(WRITABLE_REGISTERS, &[FAN_SPEED]);
    }
}
