//! 订单号校验
//!
//! 订单号与提现单号共用同一套 Luhn 校验：从最右一位开始，
//! 每隔一位翻倍（翻倍后大于 9 则减 9），全部求和，总和能被 10
//! 整除即合法。算法与号码长度无关，10 位短号与 12 位以上长号
//! 走同一条路径。

/// 校验订单号格式
///
/// 非数字字符或空串直接判为不合法，不产生错误向上传播。
pub fn is_valid(number: &str) -> bool {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    checksum(number, true) % 10 == 0
}

/// 计算使 `base` 合法的校验位
///
/// 返回追加到 `base` 末尾后使整体通过 Luhn 校验的那一位数字；
/// `base` 含非数字字符或为空时返回 None。
pub fn check_digit(base: &str) -> Option<u8> {
    if base.is_empty() || !base.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    // 追加校验位后 base 的各位整体左移一位，奇偶取反
    let sum = checksum(base, false);
    Some(((10 - sum % 10) % 10) as u8)
}

/// Luhn 加权和
///
/// `odd_untouched` 为 true 时从最右位开始保持第 1、3、5…位原样
/// （完整号码的校验模式）；为 false 时从最右位开始翻倍
/// （计算校验位时的模式）。
fn checksum(digits: &str, odd_untouched: bool) -> u32 {
    digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let mut d = u32::from(b - b'0');
            let doubled = if odd_untouched { i % 2 == 1 } else { i % 2 == 0 };
            if doubled {
                d *= 2;
                if d > 9 {
                    d -= 9;
                }
            }
            d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_short_number() {
        assert!(is_valid("12345678903"));
    }

    #[test]
    fn test_valid_long_number() {
        assert!(is_valid("123456789031"));
    }

    #[test]
    fn test_invalid_check_digit() {
        assert!(!is_valid("12345678902"));
        assert!(!is_valid("123456789033"));
    }

    #[test]
    fn test_rejects_non_numeric_and_empty() {
        assert!(!is_valid(""));
        assert!(!is_valid("1234abc8903"));
        assert!(!is_valid(" 12345678903"));
        assert!(!is_valid("12345678903\n"));
        // 全角数字、负号等也一律拒绝
        assert!(!is_valid("-12345678903"));
    }

    #[test]
    fn test_check_digit_known_values() {
        // 1234567890 + 校验位 3 = 12345678903（合法）
        assert_eq!(check_digit("1234567890"), Some(3));
        assert_eq!(check_digit("12345678903"), Some(1));
    }

    #[test]
    fn test_check_digit_rejects_bad_input() {
        assert_eq!(check_digit(""), None);
        assert_eq!(check_digit("12a4"), None);
    }

    /// 性质：对任意数字串，追加正确的校验位后必定通过校验
    #[test]
    fn test_appending_check_digit_makes_valid() {
        let bases = [
            "1",
            "7992739871",
            "1234567890",
            "99999999999999",
            "4561261212345467",
            "000000",
            "2718281828459045",
        ];
        for base in bases {
            let d = check_digit(base).unwrap();
            let full = format!("{}{}", base, d);
            assert!(is_valid(&full), "base={} digit={} full={}", base, d, full);

            // 其余 9 个校验位都不合法
            for wrong in 0..10u8 {
                if wrong == d {
                    continue;
                }
                let bad = format!("{}{}", base, wrong);
                assert!(!is_valid(&bad), "应不合法: {}", bad);
            }
        }
    }
}
