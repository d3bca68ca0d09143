use tamper_encodings::AttributeEncoding;

/// Picks the encoding of a categorical attribute.
///
/// The integer pack spends `max_choices * log2(N + 1)` bits per row, the bitmap
/// pack `N`. Integer wins only when strictly smaller; ties go to bitmap.
pub fn choose_tags_encoding(possibility_count: usize, max_choices: usize) -> AttributeEncoding {
    let n = possibility_count as f64;
    let integer_cost = max_choices as f64 * (n + 1.0).log2();
    if integer_cost < n {
        AttributeEncoding::Integer
    } else {
        AttributeEncoding::Bitmap
    }
}

#[cfg(test)]
mod tests {
    use tamper_encodings::AttributeEncoding;

    use super::choose_tags_encoding;

    #[test]
    fn test_choose_tags_encoding() {
        assert_eq!(choose_tags_encoding(100, 1), AttributeEncoding::Integer);
        assert_eq!(choose_tags_encoding(3, 3), AttributeEncoding::Bitmap);
        assert_eq!(choose_tags_encoding(3, 1), AttributeEncoding::Integer);
        assert_eq!(choose_tags_encoding(2, 1), AttributeEncoding::Integer);
        // log2(2) == 1: a tie.
        assert_eq!(choose_tags_encoding(1, 1), AttributeEncoding::Bitmap);
        assert_eq!(choose_tags_encoding(0, 0), AttributeEncoding::Bitmap);
        // 15 * log2(101) ~ 99.9 < 100 but 16 * log2(101) ~ 106.5.
        assert_eq!(choose_tags_encoding(100, 15), AttributeEncoding::Integer);
        assert_eq!(choose_tags_encoding(100, 16), AttributeEncoding::Bitmap);
    }
}
