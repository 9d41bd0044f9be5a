//! Download filename selection

use crate::domain::FilingId;

/// Extension of every produced workbook
pub const WORKBOOK_EXTENSION: &str = "xlsx";

/// Reduces a name to lowercase ASCII words joined by `-`
///
/// `&` reads as `and` and other characters are transliterated to ASCII first.
/// Anything that is still not a letter or digit separates words; leading,
/// trailing and repeated separators are dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = Slug::default();
    for c in name.chars() {
        match c {
            '&' => slug.push_word("and"),
            c if c.is_ascii() => slug.push_ascii(c),
            c => match deunicode::deunicode_char(c) {
                Some(ascii) => ascii.chars().for_each(|a| slug.push_ascii(a)),
                None => slug.separate(),
            },
        }
    }
    slug.out
}

#[derive(Default)]
struct Slug {
    out: String,
    pending_dash: bool,
}

impl Slug {
    fn push_ascii(&mut self, c: char) {
        if !c.is_ascii_alphanumeric() {
            self.separate();
            return;
        }
        if self.pending_dash && !self.out.is_empty() {
            self.out.push('-');
        }
        self.pending_dash = false;
        self.out.push(c.to_ascii_lowercase());
    }

    fn push_word(&mut self, word: &str) {
        self.separate();
        word.chars().for_each(|c| self.push_ascii(c));
        self.separate();
    }

    fn separate(&mut self) {
        self.pending_dash = true;
    }
}

/// Filename offered for a filing's workbook
///
/// `{filing_id}-{slug}.xlsx`, or `{filing_id}.xlsx` when the committee name
/// has nothing left after slugging.
pub fn download_filename(filing_id: &FilingId, committee_name: &str) -> String {
    let slug = slugify(committee_name);
    if slug.is_empty() {
        format!("{filing_id}.{WORKBOOK_EXTENSION}")
    } else {
        format!("{filing_id}-{slug}.{WORKBOOK_EXTENSION}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Friends of Jane Doe"), "friends-of-jane-doe");
        assert_eq!(slugify("  ACME PAC, Inc.  "), "acme-pac-inc");
        assert_eq!(slugify("Cafe & Co -- 2016"), "cafe-and-co-2016");
        assert_eq!(slugify("Café & Co"), "cafe-and-co");
        assert_eq!(slugify("Peña für Señado"), "pena-fur-senado");
        assert_eq!(slugify("R&D PAC"), "r-and-d-pac");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_download_filename() {
        let id = FilingId::new("1285143").unwrap();
        assert_eq!(
            download_filename(&id, "Friends of Jane Doe"),
            "1285143-friends-of-jane-doe.xlsx"
        );
        assert_eq!(download_filename(&id, ""), "1285143.xlsx");
    }
}
