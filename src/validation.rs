//! Consistency checks on a [`RegisterImage`] before it is written to the chip.
//!
//! [`validate`] runs a fixed, ordered list of checks. Each check looks at the image on its own and
//! may add [`Finding`]s to the [`Verdict`]. Errors describe configurations the chip cannot measure
//! with; warnings are advisory and never block arming.
//!
//! ```rust
//! use gpx2_rs::image::RegisterImage;
//! use gpx2_rs::register::pin_ena::RefClkPin;
//! use gpx2_rs::validation::{validate, Finding};
//!
//! let mut image = RegisterImage::default();
//! image.set::<RefClkPin>(false);
//!
//! let verdict = validate(&image, 4_000_000);
//! assert!(!verdict.passed());
//! assert!(verdict.findings().contains(&Finding::RefClkDisabled));
//! ```

use crate::image::RegisterImage;
use crate::register::cmos::CmosInput;
use crate::register::fifo_mode::{BlockwiseFifo, CommonFifo};
use crate::register::hit_ena::{ChannelCombine, CombineMode, HighResolution, HiresMode, HitEnable};
use crate::register::pin_ena::{RefClkPin, StopInputsDisabled, StopPins};
use crate::register::refclk_div::{frequency_from_divisions, RefClkDivisions};
use crate::register::xosc::RefClkByXosc;
use crate::register::{Channels, CHANNEL_COUNT};
use core::fmt;
use log::{debug, error, warn};

/// Upper bound on the number of findings a single image can produce.
pub const MAX_FINDINGS: usize = 32;

const MIN_DIVISIONS: u32 = 10_000;
const MAX_DIVISIONS: u32 = 1_000_000;
const MIN_REFCLK_HZ: u64 = 20_000_000;
const HIRES_4X_MAX_DIVISIONS: u32 = 50_000;
const PULSE_WIDTH_MAX_DIVISIONS: u32 = 60_000;
const COARSE_DIVISIONS: u32 = 100_000;
const FIFO_MIN_SPI_CLOCK_HZ: u32 = 8_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One problem found in a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finding {
    /// STOP input enabled, but its hit processing is not. `channel` is 1-based.
    StopWithoutHit { channel: u8 },
    RefClkDisabled,
    InvalidChannelCombine(u8),
    InvalidHighResolution(u8),
    CommonFifoWithoutBlockwise,
    ZeroDivisions,
    DivisionsTooLow(u32),
    DivisionsUnusuallyHigh(u32),
    CmosWithoutStopPins,
    CmosWithoutRefClk,
    /// Reference clock frequency in Hz derived from the divisions.
    LowRefClkFrequency(u64),
    XoscWithRefClkPin,
    NoReferenceClock,
    StopPinsMasterDisabled,
    CombineRequiresStop1And2,
    /// HIT_ENA bits set above channel 4; carries the raw bits.
    HitBeyondStop4(u8),
    PulseDistanceWithHires4x,
    PulseDistanceWithHires,
    Hires4xWithCoarseDivisions(u32),
    StopPinsWithoutHits,
    CmosWithHiresOrCombine,
    FifoSpiTooSlow(u32),
    HiresWithoutRefClk,
    PulseDistanceIgnoresStop3And4,
    PulseWidthWithCoarseDivisions(u32),
    StopPinsWithoutRefClk,
    CoarseResolution(u32),
}

impl Finding {
    pub fn severity(&self) -> Severity {
        match self {
            Finding::StopWithoutHit { .. }
            | Finding::RefClkDisabled
            | Finding::InvalidChannelCombine(_)
            | Finding::InvalidHighResolution(_)
            | Finding::CommonFifoWithoutBlockwise
            | Finding::ZeroDivisions
            | Finding::CmosWithoutStopPins
            | Finding::CmosWithoutRefClk
            | Finding::XoscWithRefClkPin
            | Finding::NoReferenceClock
            | Finding::StopPinsMasterDisabled
            | Finding::CombineRequiresStop1And2
            | Finding::HitBeyondStop4(_)
            | Finding::StopPinsWithoutHits
            | Finding::HiresWithoutRefClk
            | Finding::StopPinsWithoutRefClk => Severity::Error,

            Finding::DivisionsTooLow(_)
            | Finding::DivisionsUnusuallyHigh(_)
            | Finding::LowRefClkFrequency(_)
            | Finding::PulseDistanceWithHires4x
            | Finding::PulseDistanceWithHires
            | Finding::Hires4xWithCoarseDivisions(_)
            | Finding::CmosWithHiresOrCombine
            | Finding::FifoSpiTooSlow(_)
            | Finding::PulseDistanceIgnoresStop3And4
            | Finding::PulseWidthWithCoarseDivisions(_)
            | Finding::CoarseResolution(_) => Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity() {
            Severity::Error => f.write_str("ERROR: ")?,
            Severity::Warning => f.write_str("WARNING: ")?,
        }

        match self {
            Finding::StopWithoutHit { channel } => {
                write!(f, "STOP{} enabled but HIT_ENA{} disabled", channel, channel)
            }
            Finding::RefClkDisabled => f.write_str("REFCLK input not enabled"),
            Finding::InvalidChannelCombine(v) => write!(f, "invalid CHANNEL_COMBINE value ({})", v),
            Finding::InvalidHighResolution(v) => write!(f, "invalid HIRES value ({})", v),
            Finding::CommonFifoWithoutBlockwise => {
                f.write_str("COMMON_FIFO enabled but BLOCKWISE_FIFO disabled")
            }
            Finding::ZeroDivisions => f.write_str("REFCLK_DIVISIONS=0"),
            Finding::DivisionsTooLow(d) => {
                write!(f, "REFCLK_DIVISIONS ({}) too low, quantization artifacts possible", d)
            }
            Finding::DivisionsUnusuallyHigh(d) => write!(f, "REFCLK_DIVISIONS ({}) unusually high", d),
            Finding::CmosWithoutStopPins => f.write_str("CMOS input enabled but no STOP pins active"),
            Finding::CmosWithoutRefClk => f.write_str("CMOS input enabled but REFCLK disabled"),
            Finding::LowRefClkFrequency(hz) => {
                write!(f, "REFCLK frequency ({} Hz) is low, may reduce resolution", hz)
            }
            Finding::XoscWithRefClkPin => {
                f.write_str("XOSC enabled but REFCLK pin also enabled, disable REFCLK when using XOSC")
            }
            Finding::NoReferenceClock => f.write_str("external REFCLK selected but REFCLK pin disabled"),
            Finding::StopPinsMasterDisabled => {
                f.write_str("STOP pins enabled but master STOP enable is off (PIN_ENA_DISABLE set)")
            }
            Finding::CombineRequiresStop1And2 => {
                f.write_str("pulse distance/width mode requires STOP1, STOP2, HIT_ENA1 and HIT_ENA2 enabled")
            }
            Finding::HitBeyondStop4(bits) => {
                write!(f, "HIT_ENA has bits set beyond STOP4 (0x{:02X})", bits)
            }
            Finding::PulseDistanceWithHires4x => {
                f.write_str("pulse distance + HIRES 4x may exceed internal timing limits at high event rates")
            }
            Finding::PulseDistanceWithHires => {
                f.write_str("pulse distance + HIRES may reduce accuracy at high event rates")
            }
            Finding::Hires4xWithCoarseDivisions(d) => {
                write!(f, "HIRES 4x with REFCLK_DIVISIONS ({}) reduces accuracy", d)
            }
            Finding::StopPinsWithoutHits => f.write_str("STOP pins enabled but all HIT_ENA bits are zero"),
            Finding::CmosWithHiresOrCombine => {
                f.write_str("CMOS input with HIRES or COMBINE modes may distort timing")
            }
            Finding::FifoSpiTooSlow(hz) => {
                write!(f, "FIFO modes enabled but SPI speed ({} Hz) may be too slow", hz)
            }
            Finding::HiresWithoutRefClk => f.write_str("HIRES requires REFCLK enabled"),
            Finding::PulseDistanceIgnoresStop3And4 => {
                f.write_str("pulse distance mode ignores STOP3/4, disable them for clarity")
            }
            Finding::PulseWidthWithCoarseDivisions(d) => write!(
                f,
                "pulse width mode with coarse REFCLK_DIVISIONS ({}) reduces base time resolution",
                d
            ),
            Finding::StopPinsWithoutRefClk => f.write_str("STOP pins active but REFCLK disabled"),
            Finding::CoarseResolution(d) => {
                write!(f, "REFCLK_DIVISIONS ({} ps) > 100000 ps reduces timing resolution", d)
            }
        }
    }
}

/// The ordered findings of one validation run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    findings: heapless::Vec<Finding, MAX_FINDINGS>,
}

impl Verdict {
    /// `true` if there are no [`Severity::Error`] findings. Warnings do not count.
    pub fn passed(&self) -> bool {
        !self.findings.iter().any(Finding::is_error)
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.is_error())
    }

    fn push(&mut self, finding: Finding) {
        match finding.severity() {
            Severity::Error => error!("{}", finding),
            Severity::Warning => warn!("{}", finding),
        }

        // The checks below cannot produce more than MAX_FINDINGS entries.
        let _ = self.findings.push(finding);
    }
}

/// One line per finding followed by the overall outcome.
impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{}", finding)?;
        }

        if self.passed() {
            writeln!(f, "CONFIG VALID")
        } else {
            writeln!(f, "CONFIG INVALID-fix errors before applying")
        }
    }
}

/// The fields the checks look at, extracted once.
struct Snapshot {
    stop_pins: Channels,
    refclk: bool,
    stop_disabled: bool,
    hit_enable: Channels,
    combine: CombineMode,
    hires: HiresMode,
    common_fifo: bool,
    blockwise_fifo: bool,
    divisions: u32,
    xosc: bool,
    cmos: bool,
}

impl Snapshot {
    fn new(image: &RegisterImage) -> Self {
        Snapshot {
            stop_pins: image.get::<StopPins>(),
            refclk: image.get::<RefClkPin>(),
            stop_disabled: image.get::<StopInputsDisabled>(),
            hit_enable: image.get::<HitEnable>(),
            combine: image.get::<ChannelCombine>(),
            hires: image.get::<HighResolution>(),
            common_fifo: image.get::<CommonFifo>(),
            blockwise_fifo: image.get::<BlockwiseFifo>(),
            divisions: image.get::<RefClkDivisions>(),
            xosc: image.get::<RefClkByXosc>(),
            cmos: image.get::<CmosInput>(),
        }
    }
}

/// Runs all consistency checks against `image`.
///
/// `spi_clock_hz` is the clock the SPI bus runs at; it decides whether the FIFO read modes can be
/// drained in time. The result only depends on the arguments, so validating the same image twice
/// gives the same findings in the same order.
pub fn validate(image: &RegisterImage, spi_clock_hz: u32) -> Verdict {
    let s = Snapshot::new(image);
    let mut verdict = Verdict::default();

    debug!("Validating GPX2 config {:02X?}", image.as_bytes());

    for i in 0..CHANNEL_COUNT {
        if s.stop_pins.is_enabled(i) && !s.hit_enable.is_enabled(i) {
            verdict.push(Finding::StopWithoutHit { channel: i as u8 + 1 });
        }
    }

    if !s.refclk {
        verdict.push(Finding::RefClkDisabled);
    }

    if s.combine == CombineMode::Reserved {
        verdict.push(Finding::InvalidChannelCombine(s.combine.into()));
    }

    if s.hires == HiresMode::Reserved {
        verdict.push(Finding::InvalidHighResolution(s.hires.into()));
    }

    if s.common_fifo && !s.blockwise_fifo {
        verdict.push(Finding::CommonFifoWithoutBlockwise);
    }

    if s.divisions == 0 {
        verdict.push(Finding::ZeroDivisions);
    } else if s.divisions < MIN_DIVISIONS {
        verdict.push(Finding::DivisionsTooLow(s.divisions));
    } else if s.divisions > MAX_DIVISIONS {
        verdict.push(Finding::DivisionsUnusuallyHigh(s.divisions));
    }

    if s.cmos {
        if s.stop_pins.is_empty() {
            verdict.push(Finding::CmosWithoutStopPins);
        }
        if !s.refclk {
            verdict.push(Finding::CmosWithoutRefClk);
        }
    }

    // Zero divisions is already an error and has no frequency.
    if let Ok(frequency) = frequency_from_divisions(s.divisions) {
        if frequency < MIN_REFCLK_HZ {
            verdict.push(Finding::LowRefClkFrequency(frequency));
        }
    }

    if s.xosc && s.refclk {
        verdict.push(Finding::XoscWithRefClkPin);
    }
    if !s.xosc && !s.refclk {
        verdict.push(Finding::NoReferenceClock);
    }

    if s.stop_disabled && !s.stop_pins.is_empty() {
        verdict.push(Finding::StopPinsMasterDisabled);
    }

    if matches!(s.combine, CombineMode::PulseDistance | CombineMode::PulseWidth) {
        let pair = Channels::CH1 | Channels::CH2;
        if !s.stop_pins.contains(pair) || !s.hit_enable.contains(pair) {
            verdict.push(Finding::CombineRequiresStop1And2);
        }
    }

    let extra_hits = s.hit_enable.bits() & !Channels::all().bits();
    if extra_hits != 0 {
        verdict.push(Finding::HitBeyondStop4(extra_hits));
    }

    if s.combine == CombineMode::PulseDistance && s.hires.is_enabled() {
        if s.hires == HiresMode::X4 {
            verdict.push(Finding::PulseDistanceWithHires4x);
        } else {
            verdict.push(Finding::PulseDistanceWithHires);
        }
    }

    if s.hires == HiresMode::X4 && s.divisions > HIRES_4X_MAX_DIVISIONS {
        verdict.push(Finding::Hires4xWithCoarseDivisions(s.divisions));
    }

    if !s.stop_pins.is_empty() && s.hit_enable.is_empty() {
        verdict.push(Finding::StopPinsWithoutHits);
    }

    if s.cmos && (s.hires.is_enabled() || s.combine.is_enabled()) {
        verdict.push(Finding::CmosWithHiresOrCombine);
    }

    if s.blockwise_fifo && s.common_fifo && spi_clock_hz < FIFO_MIN_SPI_CLOCK_HZ {
        verdict.push(Finding::FifoSpiTooSlow(spi_clock_hz));
    }

    if !s.refclk && s.hires.is_enabled() {
        verdict.push(Finding::HiresWithoutRefClk);
    }

    if s.combine == CombineMode::PulseDistance && s.stop_pins.intersects(Channels::CH3 | Channels::CH4) {
        verdict.push(Finding::PulseDistanceIgnoresStop3And4);
    }

    if s.combine == CombineMode::PulseWidth && s.divisions > PULSE_WIDTH_MAX_DIVISIONS {
        verdict.push(Finding::PulseWidthWithCoarseDivisions(s.divisions));
    }

    if !s.stop_pins.is_empty() && !s.refclk {
        verdict.push(Finding::StopPinsWithoutRefClk);
    }

    if s.divisions > COARSE_DIVISIONS {
        verdict.push(Finding::CoarseResolution(s.divisions));
    }

    verdict
}
