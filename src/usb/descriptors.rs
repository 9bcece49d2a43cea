//! Static descriptor catalog served to the host during enumeration.
//!
//! The device shows up as three interfaces in one configuration: a CDC-ACM
//! communication/data pair (the results channel) and a HID boot keyboard
//! (the stimulus channel). Everything here is fixed at build time; the
//! control state machine only ever reads it.

use super::endpoint::{
    CDC_ACM_ENDPOINT, CDC_ACM_SIZE, CDC_RX_ENDPOINT, CDC_RX_SIZE, CDC_TX_ENDPOINT, CDC_TX_SIZE,
    ENDPOINT0_SIZE, KEYBOARD_ENDPOINT, KEYBOARD_SIZE,
};

pub const VENDOR_ID: u16 = 0x16C0;
pub const PRODUCT_ID: u16 = 0x047A;

pub const SERIAL_INTERFACE: u8 = 1;
pub const KEYBOARD_INTERFACE: u8 = 2;

const DESC_CONFIG: u8 = 0x02;
const DESC_STRING: u8 = 0x03;
const DESC_INTERFACE: u8 = 0x04;
const DESC_ENDPOINT: u8 = 0x05;
const DESC_HID: u8 = 0x21;
const DESC_HID_REPORT: u8 = 0x22;
const DESC_CDC_FUNCTIONAL: u8 = 0x24;

pub static DEVICE_DESCRIPTOR: [u8; 18] = [
    18,                                           // bLength
    0x01,                                         // bDescriptorType
    0x00, 0x02,                                   // bcdUSB
    0,                                            // bDeviceClass
    0,                                            // bDeviceSubClass
    0,                                            // bDeviceProtocol
    ENDPOINT0_SIZE,                               // bMaxPacketSize0
    VENDOR_ID as u8, (VENDOR_ID >> 8) as u8,      // idVendor
    PRODUCT_ID as u8, (PRODUCT_ID >> 8) as u8,    // idProduct
    0x00, 0x01,                                   // bcdDevice
    1,                                            // iManufacturer
    2,                                            // iProduct
    3,                                            // iSerialNumber
    1,                                            // bNumConfigurations
];

/// Keyboard Protocol 1, HID 1.11 spec, Appendix B
pub static HID_REPORT_DESCRIPTOR: [u8; 63] = [
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0xE0, //   Usage Minimum (224)
    0x29, 0xE7, //   Usage Maximum (231)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)  modifier byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x03, //   Input (Constant)                  reserved byte
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (1)
    0x29, 0x05, //   Usage Maximum (5)
    0x91, 0x02, //   Output (Data, Variable, Absolute) LED report
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x03, //   Output (Constant)                 LED padding
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x68, //   Logical Maximum (104)
    0x05, 0x07, //   Usage Page (Key Codes)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x68, //   Usage Maximum (104)
    0x81, 0x00, //   Input (Data, Array)
    0xC0,       // End Collection
];

const CONFIG_DESCRIPTOR_SIZE: usize = 9 + 9 + 5 + 5 + 4 + 5 + 7 + 9 + 7 + 7 + 9 + 9 + 7;
/// Byte offset of the HID descriptor inside [`CONFIG_DESCRIPTOR`]; it is
/// also served standalone as the `(0x2100, interface)` selector.
const HID_DESC_OFFSET: usize = 9 + 9 + 5 + 5 + 4 + 5 + 7 + 9 + 7 + 7 + 9;

pub static CONFIG_DESCRIPTOR: [u8; CONFIG_DESCRIPTOR_SIZE] = [
    // configuration descriptor, USB spec 9.6.3
    9,                              // bLength
    DESC_CONFIG,                    // bDescriptorType
    CONFIG_DESCRIPTOR_SIZE as u8, 0, // wTotalLength
    3,                              // bNumInterfaces
    1,                              // bConfigurationValue
    0,                              // iConfiguration
    0xC0,                           // bmAttributes (self powered)
    50,                             // bMaxPower
    // interface 0: CDC communication, USB spec 9.6.5
    9,                              // bLength
    DESC_INTERFACE,                 // bDescriptorType
    0,                              // bInterfaceNumber
    0,                              // bAlternateSetting
    1,                              // bNumEndpoints
    0x02,                           // bInterfaceClass (CDC)
    0x02,                           // bInterfaceSubClass (ACM)
    0x01,                           // bInterfaceProtocol (AT commands)
    0,                              // iInterface
    // CDC header functional descriptor, CDC spec 5.2.3.1
    5,                              // bFunctionLength
    DESC_CDC_FUNCTIONAL,            // bDescriptorType
    0x00,                           // bDescriptorSubtype (header)
    0x10, 0x01,                     // bcdCDC
    // call management functional descriptor, CDC spec 5.2.3.2
    5,                              // bFunctionLength
    DESC_CDC_FUNCTIONAL,            // bDescriptorType
    0x01,                           // bDescriptorSubtype (call management)
    0x01,                           // bmCapabilities (handles call management)
    SERIAL_INTERFACE,               // bDataInterface
    // abstract control management functional descriptor, CDC spec 5.2.3.3
    4,                              // bFunctionLength
    DESC_CDC_FUNCTIONAL,            // bDescriptorType
    0x02,                           // bDescriptorSubtype (ACM)
    0x06,                           // bmCapabilities (line coding + send break)
    // union functional descriptor, CDC spec 5.2.3.8
    5,                              // bFunctionLength
    DESC_CDC_FUNCTIONAL,            // bDescriptorType
    0x06,                           // bDescriptorSubtype (union)
    0,                              // bMasterInterface
    SERIAL_INTERFACE,               // bSlaveInterface0
    // notification endpoint, USB spec 9.6.6
    7,                              // bLength
    DESC_ENDPOINT,                  // bDescriptorType
    CDC_ACM_ENDPOINT | 0x80,        // bEndpointAddress
    0x03,                           // bmAttributes (interrupt)
    CDC_ACM_SIZE, 0,                // wMaxPacketSize
    64,                             // bInterval
    // interface 1: CDC data
    9,                              // bLength
    DESC_INTERFACE,                 // bDescriptorType
    SERIAL_INTERFACE,               // bInterfaceNumber
    0,                              // bAlternateSetting
    2,                              // bNumEndpoints
    0x0A,                           // bInterfaceClass (CDC data)
    0x00,                           // bInterfaceSubClass
    0x00,                           // bInterfaceProtocol
    0,                              // iInterface
    // serial OUT endpoint
    7,                              // bLength
    DESC_ENDPOINT,                  // bDescriptorType
    CDC_RX_ENDPOINT,                // bEndpointAddress
    0x02,                           // bmAttributes (bulk)
    CDC_RX_SIZE, 0,                 // wMaxPacketSize
    0,                              // bInterval
    // serial IN endpoint
    7,                              // bLength
    DESC_ENDPOINT,                  // bDescriptorType
    CDC_TX_ENDPOINT | 0x80,         // bEndpointAddress
    0x02,                           // bmAttributes (bulk)
    CDC_TX_SIZE, 0,                 // wMaxPacketSize
    0,                              // bInterval
    // interface 2: HID boot keyboard
    9,                              // bLength
    DESC_INTERFACE,                 // bDescriptorType
    KEYBOARD_INTERFACE,             // bInterfaceNumber
    0,                              // bAlternateSetting
    1,                              // bNumEndpoints
    0x03,                           // bInterfaceClass (HID)
    0x01,                           // bInterfaceSubClass (boot)
    0x01,                           // bInterfaceProtocol (keyboard)
    0,                              // iInterface
    // HID descriptor, HID 1.11 spec 6.2.1
    9,                              // bLength
    DESC_HID,                       // bDescriptorType
    0x11, 0x01,                     // bcdHID
    0,                              // bCountryCode
    1,                              // bNumDescriptors
    DESC_HID_REPORT,                // bDescriptorType
    HID_REPORT_DESCRIPTOR.len() as u8, 0, // wDescriptorLength
    // keyboard IN endpoint
    7,                              // bLength
    DESC_ENDPOINT,                  // bDescriptorType
    KEYBOARD_ENDPOINT | 0x80,       // bEndpointAddress
    0x03,                           // bmAttributes (interrupt)
    KEYBOARD_SIZE, 0,               // wMaxPacketSize
    1,                              // bInterval
];

static STRING_LANGUAGE: [u8; 4] = [4, DESC_STRING, 0x09, 0x04];

// "Delusional"
static STRING_MANUFACTURER: [u8; 22] = [
    22, DESC_STRING, b'D', 0, b'e', 0, b'l', 0, b'u', 0, b's', 0, b'i', 0, b'o', 0, b'n', 0,
    b'a', 0, b'l', 0,
];

// "ScreenTimer"
static STRING_PRODUCT: [u8; 24] = [
    24, DESC_STRING, b'S', 0, b'c', 0, b'r', 0, b'e', 0, b'e', 0, b'n', 0, b'T', 0, b'i', 0,
    b'm', 0, b'e', 0, b'r', 0,
];

static STRING_SERIAL_NUMBER: [u8; 4] = [4, DESC_STRING, b'1', 0];

struct DescriptorEntry {
    w_value: u16,
    w_index: u16,
    data: &'static [u8],
}

/// Which bytes answer which `GET_DESCRIPTOR` selector. Scanned linearly;
/// the order is the match priority and must not be reshuffled.
static DESCRIPTOR_LIST: [DescriptorEntry; 8] = [
    DescriptorEntry {
        w_value: 0x0100,
        w_index: 0x0000,
        data: &DEVICE_DESCRIPTOR,
    },
    DescriptorEntry {
        w_value: 0x0200,
        w_index: 0x0000,
        data: &CONFIG_DESCRIPTOR,
    },
    DescriptorEntry {
        w_value: 0x2200,
        w_index: KEYBOARD_INTERFACE as u16,
        data: &HID_REPORT_DESCRIPTOR,
    },
    DescriptorEntry {
        w_value: 0x2100,
        w_index: KEYBOARD_INTERFACE as u16,
        data: hid_descriptor(),
    },
    DescriptorEntry {
        w_value: 0x0300,
        w_index: 0x0000,
        data: &STRING_LANGUAGE,
    },
    DescriptorEntry {
        w_value: 0x0301,
        w_index: 0x0409,
        data: &STRING_MANUFACTURER,
    },
    DescriptorEntry {
        w_value: 0x0302,
        w_index: 0x0409,
        data: &STRING_PRODUCT,
    },
    DescriptorEntry {
        w_value: 0x0303,
        w_index: 0x0409,
        data: &STRING_SERIAL_NUMBER,
    },
];

/// The 9-byte HID descriptor is not stored twice; it is a window into the
/// configuration descriptor.
const fn hid_descriptor() -> &'static [u8] {
    let (_, tail) = CONFIG_DESCRIPTOR.split_at(HID_DESC_OFFSET);
    tail.split_at(9).0
}

/// Resolve a `GET_DESCRIPTOR` selector. First exact match wins; `None`
/// means the control endpoint must stall.
pub fn lookup(w_value: u16, w_index: u16) -> Option<&'static [u8]> {
    DESCRIPTOR_LIST
        .iter()
        .find(|entry| entry.w_value == w_value && entry.w_index == w_index)
        .map(|entry| entry.data)
}
