/// Concatenates supplied slices into one continuous vector.
#[macro_export]
macro_rules! concat_slices {
    ($($slice: expr),+) => {
        [$(&$slice[..]),+].concat()
    }
}

/// Return `$error` built from both values if `$left` and `$right` are not equal.
#[macro_export]
macro_rules! expect_equality {
    ($left: expr, $right: expr, $error: expr) => {
        if $left != $right {
            return Err($error($left, $right));
        }
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn concat() {
        let label = b"label";
        let counter = 7u32;
        let v = concat_slices!(label, b" : ", counter.to_le_bytes());
        assert_eq!(v, b"label : \x07\x00\x00\x00".to_vec());
    }

    #[test]
    fn equality() {
        #[derive(Debug)]
        enum Err {
            Unequal(usize, usize),
        }

        fn check(len: usize, expected: usize) -> Result<usize, Err> {
            expect_equality!(len, expected, Err::Unequal);
            Ok(len)
        }

        assert!(check(3, 3).is_ok());
        assert!(matches!(check(2, 3), Err(Err::Unequal(2, 3))));
    }
}
