use crate::{Sequence, SequenceError};

/// Implements fallible collect into `Sequence`.
pub trait SequenceIterator: Iterator {
    fn collect_sequence(self) -> Result<Sequence<Self::Item>, SequenceError>;

    fn try_collect_sequence<I, E>(self) -> Result<Sequence<I>, E>
        where
            Self: Iterator<Item=Result<I, E>>,
            E: From<SequenceError>;
}

impl<Q: Iterator> SequenceIterator for Q {
    fn collect_sequence(self) -> Result<Sequence<Self::Item>, SequenceError> {
        let (lower, _) = self.size_hint();
        let mut sequence = Sequence::with_capacity(lower)?;
        for item in self {
            sequence.push(item)?;
        }
        Ok(sequence)
    }

    fn try_collect_sequence<I, E>(self) -> Result<Sequence<I>, E>
        where
            Self: Iterator<Item=Result<I, E>>,
            E: From<SequenceError>
    {
        let (lower, _) = self.size_hint();
        let mut sequence = Sequence::with_capacity(lower)?;
        for mi in self {
            let i = mi?;
            sequence.push(i)?;
        }
        Ok(sequence)
    }
}

#[cfg(test)]
mod traits_tests {
    use crate::{SequenceError, SequenceIterator};

    #[derive(Debug)]
    enum ParseError {
        Sequence(SequenceError),
        Negative(i64),
    }

    impl From<SequenceError> for ParseError {
        fn from(e: SequenceError) -> Self {
            ParseError::Sequence(e)
        }
    }

    fn non_negative(v: i64) -> Result<i64, ParseError> {
        if v < 0 { Err(ParseError::Negative(v)) } else { Ok(v) }
    }

    #[test]
    fn collects_with_exact_capacity() {
        let items = (0..12).map(|v| v as i16).collect_sequence().unwrap();
        assert_eq!(12, items.len());
        assert_eq!(12, items.capacity());
        for (i, (item, expected)) in items.iter().zip((0..12).map(|v| v as i16)).enumerate() {
            assert_eq!(*item, expected, "at index {}", i);
        }
    }

    #[test]
    fn collects_without_size_hint() {
        let items = (0..100).filter(|v| v % 3 == 0).collect_sequence().unwrap();
        assert_eq!(34, items.len());
        assert_eq!(Some(&99), items.back());
    }

    #[test]
    fn try_collect_stops_at_first_error() {
        let ok = [1i64, 2, 3].iter().map(|v| non_negative(*v)).try_collect_sequence().unwrap();
        assert_eq!(ok, [1, 2, 3]);

        let err = [1i64, -2, 3, -4].iter().map(|v| non_negative(*v)).try_collect_sequence().unwrap_err();
        assert!(matches!(err, ParseError::Negative(-2)), "{:?}", err);
    }
}
