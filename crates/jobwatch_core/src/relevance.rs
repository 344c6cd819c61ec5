/// Terms that mark a listing as a work-study contract.
pub const DEFAULT_EMPLOYMENT_TERMS: &[&str] = &[
    "alternance",
    "alternant",
    "apprenti",
    "apprenti(e)",
    "apprentissage",
];

/// Terms that mark a listing as security related.
pub const DEFAULT_DOMAIN_TERMS: &[&str] = &[
    "cyber",
    "cybersécurité",
    "cybersecurity",
    "security",
    "sécurité",
    "securite",
    "it security",
    "information security",
    "aws",
    "azure",
    "firewall",
    "pare-feu",
    "réseau",
    "réseaux",
    "network",
    "ssi",
    "pssi",
    "iso 27001",
    "soc",
    "siem",
    "csirt",
    "cert",
    "edr",
    "xdr",
    "dlp",
    "waf",
    "ids",
    "ips",
    "pentest",
    "pentester",
    "red team",
    "blue team",
    "grc",
    "gouvernance",
    "risque",
    "conformité",
    "rgpd",
    "gdpr",
    "ebios",
    "cnil",
    "dora",
    "pca",
    "pra",
    "iam",
    "pam",
    "active directory",
    "infrastructure sécurisée",
    "sécurisé",
    "sécurisées",
    "devsecops",
    "forensic",
    "incident",
    "threat",
    "vulnerability",
];

/// Dual keyword-set filter: a text is relevant when it contains at least one
/// employment term and at least one domain term.
///
/// Matching is plain substring containment on the lower-cased text, so
/// "soc" also matches "société". That trade-off is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    employment: Vec<String>,
    domain: Vec<String>,
}

impl KeywordFilter {
    pub fn new<E, D>(employment: E, domain: D) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            employment: lowered(employment),
            domain: lowered(domain),
        }
    }

    pub fn is_relevant(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        contains_any(&text, &self.employment) && contains_any(&text, &self.domain)
    }
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EMPLOYMENT_TERMS, DEFAULT_DOMAIN_TERMS)
    }
}

fn lowered<I>(terms: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    terms
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn contains_any(text: &str, terms: &[String]) -> bool {
    terms.iter().any(|term| text.contains(term.as_str()))
}
