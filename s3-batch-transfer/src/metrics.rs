/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;
use std::time::Duration;

/// Units of measurement
pub mod unit {
    use std::{fmt, str::FromStr};

    /// Byte units, binary (KiB, MiB, ...) and bit scaled (Kb, Mb, ...)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ByteUnit {
        /// 1 byte
        Byte,
        /// 1000 bits (125 bytes)
        Kilobit,
        /// 2<sup>10</sup> bytes.
        Kibibyte,
        /// 125 * 10<sup>3</sup> bytes.
        Megabit,
        /// 2<sup>20</sup> bytes.
        Mebibyte,
        /// 125 * 10<sup>6</sup> bytes.
        Gigabit,
        /// 2<sup>30</sup> bytes.
        Gibibyte,
        /// 2<sup>40</sup> bytes.
        Tebibyte,
    }

    impl ByteUnit {
        /// Convert some number of bytes into this unit as an `f64`
        pub fn convert(&self, bytes: u64) -> f64 {
            bytes as f64 * 8.0 / self.as_bits_u64() as f64
        }

        /// Pick the largest binary unit not larger than `total_bytes` and return a
        /// [`ByteCountDisplayContext`] for it
        pub fn display(total_bytes: u64) -> ByteCountDisplayContext {
            let units = &[
                ByteUnit::Tebibyte,
                ByteUnit::Gibibyte,
                ByteUnit::Mebibyte,
                ByteUnit::Kibibyte,
            ];
            let unit = units
                .iter()
                .copied()
                .find(|u| total_bytes >= u.as_bytes_u64())
                .unwrap_or(ByteUnit::Byte);

            ByteCountDisplayContext::new(total_bytes, unit)
        }

        /// The number of bits represented by this unit
        pub const fn as_bits_u64(&self) -> u64 {
            match self {
                ByteUnit::Byte => 8,
                ByteUnit::Kilobit => 1_000,
                ByteUnit::Kibibyte => 1 << 13,
                ByteUnit::Megabit => 1_000_000,
                ByteUnit::Mebibyte => 1 << 23,
                ByteUnit::Gigabit => 1_000_000_000,
                ByteUnit::Gibibyte => 1 << 33,
                ByteUnit::Tebibyte => 1 << 43,
            }
        }

        /// The number of whole bytes represented by this unit
        pub const fn as_bytes_u64(&self) -> u64 {
            self.as_bits_u64() >> 3
        }

        /// Whether this unit counts bits rather than bytes
        pub const fn is_bit_scaled(&self) -> bool {
            matches!(
                self,
                ByteUnit::Kilobit | ByteUnit::Megabit | ByteUnit::Gigabit
            )
        }

        pub(crate) const fn as_str(&self) -> &'static str {
            match self {
                ByteUnit::Byte => "B",
                ByteUnit::Kilobit => "Kb",
                ByteUnit::Kibibyte => "KiB",
                ByteUnit::Megabit => "Mb",
                ByteUnit::Mebibyte => "MiB",
                ByteUnit::Gigabit => "Gb",
                ByteUnit::Gibibyte => "GiB",
                ByteUnit::Tebibyte => "TiB",
            }
        }
    }

    impl AsRef<str> for ByteUnit {
        fn as_ref(&self) -> &str {
            self.as_str()
        }
    }

    impl FromStr for ByteUnit {
        type Err = crate::error::Error;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let unit = match s {
                "B" => ByteUnit::Byte,
                "Kb" => ByteUnit::Kilobit,
                "KiB" => ByteUnit::Kibibyte,
                "Mb" => ByteUnit::Megabit,
                "MiB" => ByteUnit::Mebibyte,
                "Gb" => ByteUnit::Gigabit,
                "GiB" => ByteUnit::Gibibyte,
                "TiB" => ByteUnit::Tebibyte,
                _ => {
                    return Err(crate::error::invalid_input(format!(
                        "unknown byte unit '{s}'"
                    )))
                }
            };

            Ok(unit)
        }
    }

    /// Formats a byte count in a particular unit, e.g. `3.420 KiB`
    #[derive(Debug, Clone, Copy)]
    pub struct ByteCountDisplayContext {
        /// Number of bytes to display
        pub total_bytes: u64,
        /// Unit to display the count in
        pub unit: ByteUnit,
    }

    impl ByteCountDisplayContext {
        /// Create a new display context for the number of bytes in a specific unit
        pub fn new(total_bytes: u64, unit: ByteUnit) -> Self {
            Self { total_bytes, unit }
        }
    }

    impl fmt::Display for ByteCountDisplayContext {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let bits = self.total_bytes.saturating_mul(8);
            if bits % self.unit.as_bits_u64() == 0 {
                return write!(
                    f,
                    "{} {}",
                    bits / self.unit.as_bits_u64(),
                    self.unit.as_str()
                );
            }
            let precision = f.precision().unwrap_or(3);
            write!(
                f,
                "{:.*} {}",
                precision,
                self.unit.convert(self.total_bytes),
                self.unit.as_str()
            )
        }
    }
}

/// Bytes transferred over some duration
#[derive(Debug, Clone, Copy)]
pub struct Throughput {
    bytes_transferred: u64,
    elapsed: Duration,
}

impl Throughput {
    /// Create a new throughput measurement with the given bytes transferred and time elapsed
    pub const fn new(bytes_transferred: u64, elapsed: Duration) -> Throughput {
        Throughput {
            bytes_transferred,
            elapsed,
        }
    }

    /// Total bytes transferred
    pub const fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Time over which the bytes were transferred
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Convert this throughput into a specific unit per second.
    ///
    /// A zero duration yields `0.0` rather than infinity.
    pub fn as_unit_per_sec(&self, unit: unit::ByteUnit) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        unit.convert(self.bytes_transferred) / secs
    }

    /// Convert this throughput into bytes / sec
    pub fn as_bytes_per_sec(&self) -> f64 {
        self.as_unit_per_sec(unit::ByteUnit::Byte)
    }

    /// Returns a type that can be used to format/display this throughput in a particular unit
    pub fn display_as(&self, unit: unit::ByteUnit) -> ThroughputDisplayContext<'_> {
        ThroughputDisplayContext {
            throughput: self,
            unit,
        }
    }
}

impl PartialEq for Throughput {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes_per_sec() == other.as_bytes_per_sec()
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display_as(unit::ByteUnit::Mebibyte), f)
    }
}

/// Display context to format throughput in a particular unit
#[derive(Debug)]
pub struct ThroughputDisplayContext<'a> {
    /// The throughput measurement to display
    pub throughput: &'a Throughput,
    /// The unit to display the throughput as
    pub unit: unit::ByteUnit,
}

impl fmt::Display for ThroughputDisplayContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(2);
        write!(
            f,
            "{:.*} {}/s",
            precision,
            self.throughput.as_unit_per_sec(self.unit),
            self.unit.as_str()
        )
    }
}
