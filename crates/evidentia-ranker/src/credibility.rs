//! Web source classification and credibility by URL domain.
//! Pure function of the URL text; no network access.

use evidentia_common::{WebResult, WebSourceType};
use url::Url;

struct CredibilityRule {
    needles: &'static [&'static str],
    source_type: WebSourceType,
    credibility: f64,
}

/// Evaluated in order; the first rule whose needle appears in the host wins.
const CREDIBILITY_RULES: &[CredibilityRule] = &[
    CredibilityRule { needles: &["pubmed", "ncbi"],      source_type: WebSourceType::Academic,         credibility: 0.95 },
    CredibilityRule { needles: &["nih.gov", "cdc.gov"],  source_type: WebSourceType::MedicalAuthority, credibility: 0.90 },
    CredibilityRule { needles: &["mayoclinic"],          source_type: WebSourceType::MedicalAuthority, credibility: 0.85 },
    CredibilityRule { needles: &["webmd", "healthline"], source_type: WebSourceType::MedicalSite,      credibility: 0.70 },
];

const FALLBACK: (WebSourceType, f64) = (WebSourceType::News, 0.5);

/// Classify a URL into a source type and credibility score.
///
/// Matching runs on the host when the URL parses, otherwise on the whole
/// (lower-cased) text.
pub fn classify_url(url: &str) -> (WebSourceType, f64) {
    let haystack = Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| url.to_lowercase());

    CREDIBILITY_RULES
        .iter()
        .find(|rule| rule.needles.iter().any(|n| haystack.contains(n)))
        .map(|rule| (rule.source_type, rule.credibility))
        .unwrap_or(FALLBACK)
}

/// Build a classified [`WebResult`] from a raw search hit.
pub fn classify_web_result(title: &str, url: &str, content: &str) -> WebResult {
    let (source_type, credibility_score) = classify_url(url);
    WebResult {
        title: title.to_string(),
        url: url.to_string(),
        content: content.to_string(),
        source_type,
        credibility_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pubmed_is_academic() {
        assert_eq!(
            classify_url("https://pubmed.ncbi.nlm.nih.gov/12345678/"),
            (WebSourceType::Academic, 0.95)
        );
        assert_eq!(
            classify_url("https://www.ncbi.nlm.nih.gov/pmc/articles/PMC1/"),
            (WebSourceType::Academic, 0.95)
        );
    }

    #[test]
    fn test_government_authorities() {
        assert_eq!(classify_url("https://www.nih.gov/news"), (WebSourceType::MedicalAuthority, 0.9));
        assert_eq!(classify_url("https://www.cdc.gov/diabetes"), (WebSourceType::MedicalAuthority, 0.9));
        assert_eq!(
            classify_url("https://ods.od.nih.gov/factsheets/"),
            (WebSourceType::MedicalAuthority, 0.9)
        );
    }

    #[test]
    fn test_mayo_clinic() {
        assert_eq!(
            classify_url("https://www.mayoclinic.org/healthy-lifestyle"),
            (WebSourceType::MedicalAuthority, 0.85)
        );
    }

    #[test]
    fn test_consumer_health_sites() {
        assert_eq!(classify_url("https://www.webmd.com/diet"), (WebSourceType::MedicalSite, 0.7));
        assert_eq!(classify_url("https://www.healthline.com/nutrition"), (WebSourceType::MedicalSite, 0.7));
    }

    #[test]
    fn test_everything_else_is_news() {
        assert_eq!(classify_url("https://www.who.int/news"), (WebSourceType::News, 0.5));
        assert_eq!(classify_url(""), (WebSourceType::News, 0.5));
    }

    #[test]
    fn test_path_mentions_do_not_count() {
        // Only the host is inspected for well-formed URLs
        assert_eq!(
            classify_url("https://blog.example.com/why-pubmed-matters"),
            (WebSourceType::News, 0.5)
        );
    }

    #[test]
    fn test_unparsable_url_falls_back_to_text() {
        assert_eq!(classify_url("mayoclinic.org/foo"), (WebSourceType::MedicalAuthority, 0.85));
    }

    #[test]
    fn test_classify_web_result_copies_fields() {
        let r = classify_web_result("Aspartame", "https://www.cdc.gov/x", "snippet");
        assert_eq!(r.title, "Aspartame");
        assert_eq!(r.content, "snippet");
        assert_eq!(r.source_type, WebSourceType::MedicalAuthority);
        assert_eq!(r.credibility_score, 0.9);
    }
}
