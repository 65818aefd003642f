//! Flag producing arithmetic.
//!
//! Instructions `8xy4` through `8xyE` produce a value for `Vx` and a flag
//! for `VF`. The flag is returned explicitly so the caller decides where
//! it goes, instead of the operation silently clobbering a register.

/// Result of an arithmetic operation that defines the `VF` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluResult {
    pub value: u8,
    /// Either 0 or 1.
    pub flag: u8,
}

impl AluResult {
    #[inline(always)]
    fn new(value: u8, flag: bool) -> Self {
        Self {
            value,
            flag: flag as u8,
        }
    }
}

/// 8XY4 (ADD Vx, Vy)
///
/// Flag is the carry out of bit 7.
#[inline]
pub fn add(x: u8, y: u8) -> AluResult {
    let (value, carry) = x.overflowing_add(y);
    AluResult::new(value, carry)
}

/// 8XY5 (SUB Vx, Vy)
///
/// Flag is set when `y` is strictly larger than `x`, meaning the
/// subtraction borrowed.
#[inline]
pub fn sub(x: u8, y: u8) -> AluResult {
    AluResult::new(x.wrapping_sub(y), y > x)
}

/// 8XY7 (SUBN Vx, Vy)
///
/// Subtracts `x` from `y`. Flag is set when `x` is strictly larger than `y`.
#[inline]
pub fn subn(x: u8, y: u8) -> AluResult {
    AluResult::new(y.wrapping_sub(x), x > y)
}

/// 8XY6 (SHR Vx)
///
/// Flag is the bit shifted out on the right.
#[inline]
pub fn shr(x: u8) -> AluResult {
    AluResult::new(x >> 1, x & 1 == 1)
}

/// 8XYE (SHL Vx)
///
/// Flag is the bit shifted out on the left.
#[inline]
pub fn shl(x: u8) -> AluResult {
    AluResult::new(x << 1, x & 0x80 != 0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_add_carry() {
        assert_eq!(add(0xFF, 0x01), AluResult { value: 0, flag: 1 });
        assert_eq!(add(0x80, 0x7F), AluResult { value: 0xFF, flag: 0 });
        assert_eq!(add(0xF0, 0xF0), AluResult { value: 0xE0, flag: 1 });
    }

    #[test]
    fn test_add_carry_exhaustive() {
        for x in 0..=u8::MAX {
            for y in 0..=u8::MAX {
                let sum = x as u16 + y as u16;
                let result = add(x, y);
                assert_eq!(result.value as u16, sum % 256);
                assert_eq!(result.flag == 1, sum > 255);
            }
        }
    }

    #[test]
    fn test_sub_borrow() {
        assert_eq!(sub(0x01, 0x02), AluResult { value: 0xFF, flag: 1 });
        assert_eq!(sub(0x02, 0x01), AluResult { value: 0x01, flag: 0 });
        // Equal operands do not borrow.
        assert_eq!(sub(0x10, 0x10), AluResult { value: 0x00, flag: 0 });
    }

    #[test]
    fn test_subn_borrow() {
        assert_eq!(subn(0x02, 0x01), AluResult { value: 0xFF, flag: 1 });
        assert_eq!(subn(0x01, 0x02), AluResult { value: 0x01, flag: 0 });
        assert_eq!(subn(0x10, 0x10), AluResult { value: 0x00, flag: 0 });
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shr(0b0000_0011), AluResult { value: 0b01, flag: 1 });
        assert_eq!(shr(0b0000_0010), AluResult { value: 0b01, flag: 0 });
        assert_eq!(shl(0b1000_0001), AluResult { value: 0b10, flag: 1 });
        assert_eq!(shl(0b0100_0000), AluResult { value: 0x80, flag: 0 });
    }
}
