//! Section banners in the run log

/// Banner width in columns
pub const BANNER_WIDTH: usize = 40;

/// Render the three banner lines for `title`
#[must_use]
pub fn banner_lines(title: &str) -> [String; 3] {
    let rule = "=".repeat(BANNER_WIDTH);
    [rule.clone(), format!("{title:^width$}", width = BANNER_WIDTH), rule]
}

/// Log a section banner at INFO level
pub fn banner(title: &str) {
    for line in banner_lines(title) {
        tracing::info!("{}", line.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_centred() {
        let [top, middle, bottom] = banner_lines("Table sync");
        assert_eq!(top.len(), BANNER_WIDTH);
        assert_eq!(top, bottom);
        assert_eq!(middle.len(), BANNER_WIDTH);
        assert_eq!(middle.trim(), "Table sync");
        assert_eq!(middle.find('T'), Some(15));
    }
}
