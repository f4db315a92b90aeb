//! CSV export
//!
//! Columns are `title,date,url`. The file starts with a UTF-8 byte order mark
//! so spreadsheet tools detect the encoding of non-Latin titles.

use crate::article::Article;
use crate::output::traits::OutputResult;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Header row of the CSV export
pub const CSV_HEADER: [&str; 3] = ["title", "date", "url"];

/// Renders `articles` as CSV bytes (BOM, header, one row per article)
///
/// An unknown date is an empty field. Quoting follows RFC 4180 via the `csv`
/// crate, so commas, quotes and line breaks inside titles survive.
pub fn render_csv(articles: &[Article]) -> OutputResult<Vec<u8>> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(CSV_HEADER)?;
        for article in articles {
            writer.write_record([
                article.title.as_str(),
                article.date_string().as_str(),
                article.url.as_str(),
            ])?;
        }
        writer.flush()?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(bytes: &[u8]) -> &str {
        std::str::from_utf8(&bytes[UTF8_BOM.len()..]).unwrap()
    }

    #[test]
    fn test_header_only_for_empty_collection() {
        let bytes = render_csv(&[]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(text(&bytes), "title,date,url\n");
    }

    #[test]
    fn test_rows_and_null_date() {
        let articles = vec![
            Article::new("氢能", NaiveDate::from_ymd_opt(2025, 9, 15), "https://x/1"),
            Article::new("B", None, "https://x/2"),
        ];
        let bytes = render_csv(&articles).unwrap();

        assert_eq!(
            text(&bytes),
            "title,date,url\n氢能,2025-09-15,https://x/1\nB,,https://x/2\n"
        );
    }

    #[test]
    fn test_quotes_delimiters_and_line_breaks() {
        let articles = vec![Article::new(
            "Line one\nline, \"two\"",
            None,
            "https://x/1",
        )];
        let bytes = render_csv(&articles).unwrap();

        let mut reader = csv::Reader::from_reader(&bytes[UTF8_BOM.len()..]);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "Line one\nline, \"two\"");
        assert_eq!(&rows[0][2], "https://x/1");
    }
}
