//! Output file naming.
//!
//! Import tools drop files as `Scan.PDF.convert` or `scan.pdf.import`;
//! the rewritten copy is always a lower-case `.pdf`. Only the output name is
//! normalised: the original keeps its exact name in the backup folder.

/// Suffixes collapsed to `.pdf`. Matched against the lower-cased name.
const PENDING_SUFFIXES: [&str; 2] = [".pdf.convert", ".pdf.import"];

/// Lower-case `name` and collapse a trailing `.pdf.convert` / `.pdf.import`
/// to `.pdf`.
///
/// Idempotent: `normalize_name(&normalize_name(x)) == normalize_name(x)`.
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    for suffix in PENDING_SUFFIXES {
        if let Some(stem) = lower.strip_suffix(suffix) {
            return format!("{stem}.pdf");
        }
    }
    lower
}

/// Whether a file should go through the PDF rewriter.
///
/// True for names ending (case-insensitively) in `.pdf`, `.pdf.convert` or
/// `.pdf.import`, i.e. exactly when the normalised name ends in `.pdf`.
pub fn is_pdf_candidate(name: &str) -> bool {
    normalize_name(name).ends_with(".pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_pending_suffixes() {
        assert_eq!(normalize_name("Report.PDF.Convert"), "report.pdf");
        assert_eq!(normalize_name("scan.pdf.import"), "scan.pdf");
        assert_eq!(normalize_name("Invoice.pdf"), "invoice.pdf");
        assert_eq!(normalize_name("data.pdf"), "data.pdf");
    }

    #[test]
    fn only_trailing_suffix_is_collapsed() {
        assert_eq!(normalize_name("a.pdf.convert.bak"), "a.pdf.convert.bak");
        assert_eq!(
            normalize_name("a.pdf.import.pdf.convert"),
            "a.pdf.import.pdf"
        );
    }

    #[test]
    fn idempotent() {
        for name in [
            "Report.PDF.Convert",
            "x.pdf.import",
            "notes.TXT",
            "a.pdf.convert.pdf.convert",
            "",
        ] {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once, "input: {name}");
        }
    }

    #[test]
    fn eligibility() {
        assert!(is_pdf_candidate("a.pdf"));
        assert!(is_pdf_candidate("A.PDF"));
        assert!(is_pdf_candidate("a.Pdf.Convert"));
        assert!(is_pdf_candidate("a.pdf.import"));
        assert!(!is_pdf_candidate("a.pdf.bak"));
        assert!(!is_pdf_candidate("readme.txt"));
        assert!(!is_pdf_candidate("pdf"));
    }
}
