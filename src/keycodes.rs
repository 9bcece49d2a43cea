//! HID keyboard usage IDs (HID Usage Tables 1.12, section 10), as the
//! command layer accepts them in `K` commands and the press primitives
//! put them on the wire.

// Modifier bitmasks for the report's first byte, not usage IDs.
pub const MODIFIER_CTRL: u8 = 0x01;
pub const MODIFIER_SHIFT: u8 = 0x02;
pub const MODIFIER_ALT: u8 = 0x04;
pub const MODIFIER_GUI: u8 = 0x08;
pub const MODIFIER_RIGHT_CTRL: u8 = 0x10;
pub const MODIFIER_RIGHT_SHIFT: u8 = 0x20;
pub const MODIFIER_RIGHT_ALT: u8 = 0x40;
pub const MODIFIER_RIGHT_GUI: u8 = 0x80;

pub const KEY_A: u8 = 4;
pub const KEY_B: u8 = 5;
pub const KEY_C: u8 = 6;
pub const KEY_D: u8 = 7;
pub const KEY_E: u8 = 8;
pub const KEY_F: u8 = 9;
pub const KEY_G: u8 = 10;
pub const KEY_H: u8 = 11;
pub const KEY_I: u8 = 12;
pub const KEY_J: u8 = 13;
pub const KEY_K: u8 = 14;
pub const KEY_L: u8 = 15;
pub const KEY_M: u8 = 16;
pub const KEY_N: u8 = 17;
pub const KEY_O: u8 = 18;
pub const KEY_P: u8 = 19;
pub const KEY_Q: u8 = 20;
pub const KEY_R: u8 = 21;
pub const KEY_S: u8 = 22;
pub const KEY_T: u8 = 23;
pub const KEY_U: u8 = 24;
pub const KEY_V: u8 = 25;
pub const KEY_W: u8 = 26;
pub const KEY_X: u8 = 27;
pub const KEY_Y: u8 = 28;
pub const KEY_Z: u8 = 29;
pub const KEY_1: u8 = 30;
pub const KEY_2: u8 = 31;
pub const KEY_3: u8 = 32;
pub const KEY_4: u8 = 33;
pub const KEY_5: u8 = 34;
pub const KEY_6: u8 = 35;
pub const KEY_7: u8 = 36;
pub const KEY_8: u8 = 37;
pub const KEY_9: u8 = 38;
pub const KEY_0: u8 = 39;
pub const KEY_ENTER: u8 = 40;
pub const KEY_ESC: u8 = 41;
pub const KEY_BACKSPACE: u8 = 42;
pub const KEY_TAB: u8 = 43;
pub const KEY_SPACE: u8 = 44;
pub const KEY_MINUS: u8 = 45;
pub const KEY_EQUAL: u8 = 46;
pub const KEY_LEFT_BRACE: u8 = 47;
pub const KEY_RIGHT_BRACE: u8 = 48;
pub const KEY_BACKSLASH: u8 = 49;
pub const KEY_NUMBER: u8 = 50;
pub const KEY_SEMICOLON: u8 = 51;
pub const KEY_QUOTE: u8 = 52;
pub const KEY_TILDE: u8 = 53;
pub const KEY_COMMA: u8 = 54;
pub const KEY_PERIOD: u8 = 55;
pub const KEY_SLASH: u8 = 56;
pub const KEY_CAPS_LOCK: u8 = 57;
pub const KEY_F1: u8 = 58;
pub const KEY_F2: u8 = 59;
pub const KEY_F3: u8 = 60;
pub const KEY_F4: u8 = 61;
pub const KEY_F5: u8 = 62;
pub const KEY_F6: u8 = 63;
pub const KEY_F7: u8 = 64;
pub const KEY_F8: u8 = 65;
pub const KEY_F9: u8 = 66;
pub const KEY_F10: u8 = 67;
pub const KEY_F11: u8 = 68;
pub const KEY_F12: u8 = 69;
pub const KEY_PRINTSCREEN: u8 = 70;
pub const KEY_SCROLL_LOCK: u8 = 71;
pub const KEY_PAUSE: u8 = 72;
pub const KEY_INSERT: u8 = 73;
pub const KEY_HOME: u8 = 74;
pub const KEY_PAGE_UP: u8 = 75;
pub const KEY_DELETE: u8 = 76;
pub const KEY_END: u8 = 77;
pub const KEY_PAGE_DOWN: u8 = 78;
pub const KEY_RIGHT: u8 = 79;
pub const KEY_LEFT: u8 = 80;
pub const KEY_DOWN: u8 = 81;
pub const KEY_UP: u8 = 82;
pub const KEY_NUM_LOCK: u8 = 83;
pub const KEYPAD_SLASH: u8 = 84;
pub const KEYPAD_ASTERIX: u8 = 85;
pub const KEYPAD_MINUS: u8 = 86;
pub const KEYPAD_PLUS: u8 = 87;
pub const KEYPAD_ENTER: u8 = 88;
pub const KEYPAD_1: u8 = 89;
pub const KEYPAD_2: u8 = 90;
pub const KEYPAD_3: u8 = 91;
pub const KEYPAD_4: u8 = 92;
pub const KEYPAD_5: u8 = 93;
pub const KEYPAD_6: u8 = 94;
pub const KEYPAD_7: u8 = 95;
pub const KEYPAD_8: u8 = 96;
pub const KEYPAD_9: u8 = 97;
pub const KEYPAD_0: u8 = 98;
pub const KEYPAD_PERIOD: u8 = 99;
