//! ScreenTimer firmware entry: hardware bring-up, then the command
//! loop bridging the serial protocol to the measurement primitives.

#![no_std]
#![no_main]

use panic_halt as _;

use avr_device::atmega32u4::{Peripherals, ADC, TC1};
use screentimer::atmega32u4::{install, AvrUsbRegs};
use screentimer::protocol::{self, Command, LineReader};
use screentimer::usb::UsbDevice;
use screentimer::{fault, keycodes};

/// The firmware-configured clock; `I` reports it as the timer
/// resolution.
const CPU_HZ: u32 = 16_000_000;

const CALIBRATE_SAMPLES: u16 = 100;
const MEASURE_SAMPLES: u16 = 1000;

type Device = UsbDevice<AvrUsbRegs>;

#[avr_device::entry]
fn main() -> ! {
    let dp = Peripherals::take().unwrap();

    // run at the full 16 MHz (prescaler change is a timed sequence)
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0x80) });
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0x00) });

    // debug LED on PD6, off; photo sensor input on PD4 (ADC8)
    dp.PORTD
        .ddrd
        .modify(|r, w| unsafe { w.bits((r.bits() | 0x40) & !0x10) });
    dp.PORTD.portd.modify(|r, w| unsafe { w.bits(r.bits() & !0x40) });
    dp.CPU.mcucr.modify(|r, w| unsafe { w.bits(r.bits() & !0x10) });

    // ADC: AVcc reference, channel ADC8, high-speed mode, prescaler 64
    dp.ADC.admux.write(|w| unsafe { w.bits(0x40) });
    dp.ADC.adcsrb.write(|w| unsafe { w.bits(0xA0) });
    dp.ADC.adcsra.write(|w| unsafe { w.bits(0x86) });

    fault::set_fault_hook(led_halt);
    let usb = install(UsbDevice::new(AvrUsbRegs::new(dp.USB_DEVICE, dp.PLL)));
    unsafe { avr_device::interrupt::enable() };

    while !usb.configured() {}

    let mut test_key = keycodes::KEY_B;
    let mut reset_key = keycodes::KEY_ESC;

    loop {
        // a terminal opening the port raises DTR
        while !usb.serial().line_state().dtr() {}

        // drop any modem AT-command chatter the OS sent first
        usb.serial().flush_input();
        send(usb, protocol::BANNER);

        let mut reader = LineReader::new();
        'session: loop {
            let byte = loop {
                match usb.serial().read_byte() {
                    Some(byte) => break byte,
                    None => {
                        if !usb.configured() || !usb.serial().line_state().dtr() {
                            break 'session;
                        }
                    }
                }
            };
            let Some(line) = reader.push(byte) else {
                continue;
            };
            match protocol::parse(&line) {
                Some(Command::Calibrate) => {
                    send(usb, protocol::CALIBRATE_START);
                    let complete = calibrate(usb, &dp.ADC, &dp.TC1);
                    send_terminator(usb, complete);
                }
                Some(Command::Measure) => {
                    send(usb, protocol::MEASURE_START);
                    let complete = measure(usb, &dp.ADC, &dp.TC1, test_key, reset_key);
                    send_terminator(usb, complete);
                }
                Some(Command::Info) => {
                    send(usb, protocol::info_response(CPU_HZ).as_bytes());
                }
                Some(Command::SetKeys { test, reset }) => {
                    test_key = test;
                    reset_key = reset;
                    send(usb, protocol::ACCEPTED);
                }
                None => send(usb, protocol::REJECTED),
            }
        }
    }
}

/// Stream timer/sensor pairs so the client can pick a threshold.
fn calibrate(usb: &Device, adc: &ADC, tc1: &TC1) -> bool {
    enable_timer(tc1);
    reset_timer(tc1);
    let mut overflow = false;
    for _ in 0..CALIBRATE_SAMPLES {
        let (elapsed, wrapped) = sample(adc, tc1);
        overflow |= wrapped;
        for byte in protocol::encode_sample(elapsed.0, elapsed.1) {
            let _ = usb.serial().write_byte(byte);
        }
    }
    usb.serial().flush_output();
    disable_timer(tc1);
    !overflow
}

/// Press the test key (the synchronous send is the timing anchor), then
/// stream the sensor response with interrupts off via the serial fast
/// path. The reset key is pressed afterwards to undo the stimulus.
fn measure(usb: &Device, adc: &ADC, tc1: &TC1, test_key: u8, reset_key: u8) -> bool {
    enable_timer(tc1);
    // clients read the jitter field before the first sample record
    send(usb, &protocol::MEASURE_VARIANCE.to_be_bytes());
    // empty the transmit banks so the fast path starts writable
    usb.serial().flush_output();

    let complete = usb.press_sync(test_key).is_ok() && {
        reset_timer(tc1);
        let mut overflow = false;
        usb.serial().with_fast_writer(|w| {
            for _ in 0..MEASURE_SAMPLES {
                let (elapsed, wrapped) = sample(adc, tc1);
                overflow |= wrapped;
                w.write_u16(elapsed.0);
                w.write_u16(elapsed.1);
            }
            w.flush();
        });
        !overflow
    };

    let _ = usb.press(reset_key);
    disable_timer(tc1);
    complete
}

/// One ADC conversion plus the elapsed timer ticks since the previous
/// sample; the overflow flag marks a wrapped (unusable) elapsed value.
fn sample(adc: &ADC, tc1: &TC1) -> ((u16, u16), bool) {
    adc.adcsra.modify(|_, w| w.adsc().set_bit());
    while adc.adcsra.read().adsc().bit_is_set() {}
    let level = adc.adc.read().bits();
    let elapsed = tc1.tcnt1.read().bits();
    let wrapped = tc1.tifr1.read().tov1().bit_is_set();
    reset_timer(tc1);
    ((elapsed, level), wrapped)
}

fn enable_timer(tc1: &TC1) {
    tc1.tccr1b.write(|w| unsafe { w.bits(0x01) }); // clk/1
}

fn disable_timer(tc1: &TC1) {
    tc1.tccr1b.write(|w| unsafe { w.bits(0x00) });
}

fn reset_timer(tc1: &TC1) {
    tc1.tcnt1.write(|w| unsafe { w.bits(0) });
    tc1.tifr1.write(|w| w.tov1().set_bit());
}

/// Debug-build invariant hook: light the LED and stop.
fn led_halt() -> ! {
    // only reached from a fault trip, after main set up PORTD
    let dp = unsafe { Peripherals::steal() };
    dp.PORTD.portd.modify(|r, w| unsafe { w.bits(r.bits() | 0x40) });
    loop {
        avr_device::asm::sleep();
    }
}

fn send(usb: &Device, bytes: &[u8]) {
    for &byte in bytes {
        let _ = usb.serial().write_byte(byte);
    }
}

fn send_terminator(usb: &Device, complete: bool) {
    let terminator = if complete {
        protocol::STREAM_COMPLETE
    } else {
        protocol::STREAM_ABORTED
    };
    send(usb, &terminator);
    usb.serial().flush_output();
}
