//! Host-test double for the endpoint register file.
//!
//! Models the hardware the trait abstracts: one globally selected
//! endpoint, per-endpoint banks, a wrapping 8-bit frame counter and the
//! two device-level interrupt causes. The host side of the bus is
//! driven explicitly from tests (`host_setup`, `host_out`,
//! `host_take_in`), and every bank a release hands to the hardware is
//! logged so tests can assert on transmissions.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::endpoint::{
    Banks, DeviceEvents, EndpointConfig, EndpointKind, EpStatus, UsbRegs, CONTROL_ENDPOINT,
    ENDPOINT0_CONFIG,
};

pub type SharedBus = Rc<RefCell<MockBus>>;

#[derive(Default)]
struct MockEndpoint {
    enabled: bool,
    config: Option<EndpointConfig>,
    stalled: bool,
    /// Packets from the host, oldest first; the front one is the
    /// current bank.
    out_packets: VecDeque<Vec<u8>>,
    out_pos: usize,
    /// Bytes written but not yet released.
    in_current: Vec<u8>,
    /// Banks released to the hardware and not yet taken by the host.
    in_pending: VecDeque<Vec<u8>>,
    /// Every released bank, in release order, kept forever.
    in_log: Vec<Vec<u8>>,
    /// Host consumes released banks immediately (control endpoint, or
    /// tests that do not care about bank occupancy).
    auto_take: bool,
    setup_pending: bool,
    setup_bytes: VecDeque<u8>,
    toggle_resets: usize,
}

impl MockEndpoint {
    fn bank_count(&self) -> usize {
        match self.config.map(|c| c.banks) {
            Some(Banks::Double) => 2,
            _ => 1,
        }
    }

    fn size(&self) -> usize {
        self.config.map(|c| c.size as usize).unwrap_or(0)
    }

    fn is_in(&self) -> bool {
        matches!(
            self.config.map(|c| c.kind),
            Some(EndpointKind::BulkIn | EndpointKind::InterruptIn)
        )
    }

    fn in_writable(&self) -> bool {
        self.in_pending.len() < self.bank_count() && self.in_current.len() < self.size()
    }

    fn out_readable(&self) -> bool {
        self.out_packets
            .front()
            .is_some_and(|packet| self.out_pos < packet.len())
    }
}

pub struct MockBus {
    selected: u8,
    endpoints: [MockEndpoint; 5],
    frame: u8,
    /// When set, every `frame_number` read advances the counter by one,
    /// standing in for time passing during a foreground busy-wait.
    pub frame_advance_on_read: bool,
    frame_reads: Vec<u8>,
    events: DeviceEvents,
    address: Option<u8>,
    setup_interrupt_enabled: bool,
}

impl MockBus {
    fn new() -> Self {
        MockBus {
            selected: 0,
            endpoints: Default::default(),
            frame: 0,
            frame_advance_on_read: false,
            frame_reads: Vec::new(),
            events: DeviceEvents::default(),
            address: None,
            setup_interrupt_enabled: false,
        }
    }

    fn current(&mut self) -> &mut MockEndpoint {
        &mut self.endpoints[self.selected as usize]
    }

    // ----- host side -------------------------------------------------

    /// Place a setup packet on endpoint 0.
    pub fn host_setup(&mut self, header: [u8; 8]) {
        let ep = &mut self.endpoints[CONTROL_ENDPOINT as usize];
        ep.setup_bytes = header.into_iter().collect();
        ep.setup_pending = true;
    }

    /// Deliver one OUT packet to an endpoint.
    pub fn host_out(&mut self, endpoint: u8, data: &[u8]) {
        self.endpoints[endpoint as usize]
            .out_packets
            .push_back(data.to_vec());
    }

    /// Consume the oldest in-flight IN bank, freeing its slot.
    pub fn host_take_in(&mut self, endpoint: u8) -> Option<Vec<u8>> {
        self.endpoints[endpoint as usize].in_pending.pop_front()
    }

    /// All banks the device has released on this endpoint, in order.
    pub fn sent(&self, endpoint: u8) -> &[Vec<u8>] {
        &self.endpoints[endpoint as usize].in_log
    }

    /// Drain the release log, concatenated. Control responses arrive
    /// here as a sequence of packet-size chunks.
    pub fn drain_sent(&mut self, endpoint: u8) -> Vec<u8> {
        self.endpoints[endpoint as usize]
            .in_log
            .drain(..)
            .flatten()
            .collect()
    }

    /// Like [`drain_sent`](Self::drain_sent), but keeping the chunk
    /// boundaries.
    pub fn drain_sent_packets(&mut self, endpoint: u8) -> Vec<Vec<u8>> {
        self.endpoints[endpoint as usize].in_log.drain(..).collect()
    }

    pub fn set_auto_take(&mut self, endpoint: u8, auto: bool) {
        self.endpoints[endpoint as usize].auto_take = auto;
    }

    // ----- timing ----------------------------------------------------

    pub fn set_frame(&mut self, frame: u8) {
        self.frame = frame;
    }

    pub fn frame(&self) -> u8 {
        self.frame
    }

    /// The sequence of values `frame_number` reads have returned.
    pub fn frame_reads(&self) -> &[u8] {
        &self.frame_reads
    }

    pub fn clear_frame_reads(&mut self) {
        self.frame_reads.clear();
    }

    /// Queue a 1 kHz tick for the next bus-event interrupt.
    pub fn push_frame_tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
        self.events.frame_tick = true;
    }

    pub fn push_bus_reset(&mut self) {
        self.events.bus_reset = true;
    }

    // ----- inspection ------------------------------------------------

    pub fn selected(&self) -> u8 {
        self.selected
    }

    pub fn address(&self) -> Option<u8> {
        self.address
    }

    pub fn stalled(&self, endpoint: u8) -> bool {
        self.endpoints[endpoint as usize].stalled
    }

    pub fn endpoint_enabled(&self, endpoint: u8) -> bool {
        self.endpoints[endpoint as usize].enabled
    }

    pub fn endpoint_config(&self, endpoint: u8) -> Option<EndpointConfig> {
        self.endpoints[endpoint as usize].config
    }

    pub fn setup_interrupt_enabled(&self) -> bool {
        self.setup_interrupt_enabled
    }

    pub fn toggle_resets(&self, endpoint: u8) -> usize {
        self.endpoints[endpoint as usize].toggle_resets
    }
}

/// The device-side handle implementing [`UsbRegs`] against a shared
/// [`MockBus`].
pub struct MockRegs {
    bus: SharedBus,
}

impl MockRegs {
    pub fn new() -> (MockRegs, SharedBus) {
        let bus = Rc::new(RefCell::new(MockBus::new()));
        {
            let mut b = bus.borrow_mut();
            let ep0 = &mut b.endpoints[CONTROL_ENDPOINT as usize];
            ep0.enabled = true;
            ep0.config = Some(ENDPOINT0_CONFIG);
            ep0.auto_take = true;
        }
        (MockRegs { bus: bus.clone() }, bus)
    }
}

impl UsbRegs for MockRegs {
    fn select(&mut self, ep: u8) {
        self.bus.borrow_mut().selected = ep & 0x07;
    }

    fn status(&mut self) -> EpStatus {
        let mut bus = self.bus.borrow_mut();
        let ep = bus.current();
        let mut bits = 0;
        if ep.setup_pending {
            bits |= EpStatus::RXSTPI;
        }
        if !ep.out_packets.is_empty() {
            bits |= EpStatus::RXOUTI;
        }
        if ep.is_in() {
            if ep.in_writable() {
                bits |= EpStatus::RWAL | EpStatus::TXINI;
            }
        } else {
            // Control endpoints report the IN bank free; released
            // control banks are taken by the host immediately.
            bits |= EpStatus::TXINI;
            if ep.out_readable() {
                bits |= EpStatus::RWAL;
            }
        }
        EpStatus::from_bits(bits)
    }

    fn read_byte(&mut self) -> u8 {
        let mut bus = self.bus.borrow_mut();
        let ep = bus.current();
        if let Some(byte) = ep.setup_bytes.pop_front() {
            return byte;
        }
        let pos = ep.out_pos;
        let byte = ep.out_packets.front().map(|p| p[pos]).unwrap_or(0);
        ep.out_pos += 1;
        byte
    }

    fn write_byte(&mut self, byte: u8) {
        let mut bus = self.bus.borrow_mut();
        bus.current().in_current.push(byte);
    }

    fn byte_count(&mut self) -> u8 {
        let mut bus = self.bus.borrow_mut();
        let ep = bus.current();
        ep.out_packets
            .front()
            .map(|p| (p.len() - ep.out_pos) as u8)
            .unwrap_or(0)
    }

    fn acknowledge_setup(&mut self) {
        let mut bus = self.bus.borrow_mut();
        bus.current().setup_pending = false;
    }

    fn complete_in(&mut self) {
        let mut bus = self.bus.borrow_mut();
        let ep = bus.current();
        let bank = core::mem::take(&mut ep.in_current);
        ep.in_log.push(bank.clone());
        if !ep.auto_take {
            ep.in_pending.push_back(bank);
        }
    }

    fn acknowledge_out(&mut self) {
        let mut bus = self.bus.borrow_mut();
        let ep = bus.current();
        ep.out_packets.pop_front();
        ep.out_pos = 0;
    }

    fn release_in(&mut self) {
        self.complete_in();
    }

    fn release_out(&mut self) {
        self.acknowledge_out();
    }

    fn configure(&mut self, config: EndpointConfig) {
        let mut bus = self.bus.borrow_mut();
        let ep = bus.current();
        ep.enabled = true;
        ep.config = Some(config);
        ep.stalled = false;
    }

    fn disable(&mut self) {
        let mut bus = self.bus.borrow_mut();
        let ep = bus.current();
        ep.enabled = false;
        ep.config = None;
    }

    fn enable_setup_interrupt(&mut self) {
        self.bus.borrow_mut().setup_interrupt_enabled = true;
    }

    fn stall(&mut self) {
        let mut bus = self.bus.borrow_mut();
        bus.current().stalled = true;
    }

    fn clear_stall(&mut self) {
        let mut bus = self.bus.borrow_mut();
        bus.current().stalled = false;
    }

    fn is_stalled(&mut self) -> bool {
        let mut bus = self.bus.borrow_mut();
        bus.current().stalled
    }

    fn reset_endpoints(&mut self, mask: u8) {
        let mut bus = self.bus.borrow_mut();
        for index in 0..bus.endpoints.len() {
            if mask & (1 << index) != 0 {
                let ep = &mut bus.endpoints[index];
                ep.out_packets.clear();
                ep.out_pos = 0;
                ep.in_current.clear();
                ep.in_pending.clear();
                ep.toggle_resets += 1;
            }
        }
    }

    fn set_address(&mut self, address: u8) {
        self.bus.borrow_mut().address = Some(address & 0x7F);
    }

    fn frame_number(&mut self) -> u8 {
        let mut bus = self.bus.borrow_mut();
        let frame = bus.frame;
        if bus.frame_advance_on_read {
            bus.frame = bus.frame.wrapping_add(1);
        }
        bus.frame_reads.push(frame);
        frame
    }

    fn take_device_events(&mut self) -> DeviceEvents {
        let mut bus = self.bus.borrow_mut();
        core::mem::take(&mut bus.events)
    }
}
