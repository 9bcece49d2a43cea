//! Decoding of the `bmRequestType` byte of a setup packet.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BmRequestType(u8);

impl BmRequestType {
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        BmRequestType(bits)
    }

    #[inline]
    pub const fn bits(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        if self.0 & 0x80 == 0 {
            Direction::HostToDevice
        } else {
            Direction::DeviceToHost
        }
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        match (self.0 >> 5) & 0b11 {
            0 => Kind::Standard,
            1 => Kind::Class,
            2 => Kind::Vendor,
            _ => Kind::Reserved,
        }
    }

    #[inline]
    pub fn recipient(&self) -> Recipient {
        match self.0 & 0b1_1111 {
            0 => Recipient::Device,
            1 => Recipient::Interface,
            2 => Recipient::Endpoint,
            3 => Recipient::Other,
            _ => Recipient::Reserved,
        }
    }

    /// True when all three fields decode to the given combination, i.e.
    /// the byte is exactly the one such requests carry on the wire.
    #[inline]
    pub fn is(&self, direction: Direction, kind: Kind, recipient: Recipient) -> bool {
        self.direction() == direction && self.kind() == kind && self.recipient() == recipient
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    HostToDevice,
    DeviceToHost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Kind {
    Standard,
    Class,
    Vendor,
    Reserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recipient {
    Device,
    Interface,
    Endpoint,
    Other,
    Reserved,
}
