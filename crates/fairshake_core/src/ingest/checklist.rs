//! Checklist rules evaluated against one study descriptor.

use regex::Regex;

use crate::model::answer::AnswerValue;
use crate::model::catalog::MetricId;

use super::xpath::ElementPath;
use super::IngestResult;

/// Description of the rule whose comment becomes the digital object title.
pub const TITLE_RULE: &str = "Has a title";

/// One `(query, description, metric, pattern)` checklist entry.
#[derive(Debug, Clone)]
pub struct ChecklistRule {
    pub description: String,
    /// Metric the outcome is recorded against; `None` for informational rules.
    pub metric: Option<MetricId>,
    path: ElementPath,
    pattern: Option<Regex>,
}

impl ChecklistRule {
    /// Compiles a rule. `pattern` must match at the start of the joined text.
    pub fn new(
        query: &str,
        description: &str,
        metric: Option<MetricId>,
        pattern: Option<&str>,
    ) -> IngestResult<Self> {
        let path = ElementPath::parse(query)?;
        let pattern = match pattern {
            Some(raw) => Some(Regex::new(&format!("^(?:{raw})"))?),
            None => None,
        };
        Ok(Self {
            description: description.to_string(),
            metric,
            path,
            pattern,
        })
    }

    pub fn query(&self) -> &str {
        self.path.as_str()
    }

    fn evaluate(&self, root: roxmltree::Node<'_, '_>) -> RuleOutcome {
        let matches = self.path.find_all(root);
        let comment = match &self.pattern {
            Some(_) => matches
                .iter()
                .map(|node| node.text().unwrap_or("").trim())
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string(),
            None => self.query().to_string(),
        };
        let satisfied = !matches.is_empty()
            && self
                .pattern
                .as_ref()
                .map_or(true, |pattern| pattern.is_match(&comment));

        RuleOutcome {
            description: self.description.clone(),
            metric: self.metric,
            answer: if satisfied {
                AnswerValue::YES
            } else {
                AnswerValue::NO
            },
            comment,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub description: String,
    pub metric: Option<MetricId>,
    pub answer: AnswerValue,
    pub comment: String,
}

/// Checklist applied to dbGaP `GapExchange` descriptors.
pub fn dbgap_checklist() -> IngestResult<Vec<ChecklistRule>> {
    let rules = [
        (".//StudyNameEntrez", TITLE_RULE, None, Some(".+")),
        (
            ".//Studies/Study[@accession]",
            "ID or accession number",
            Some(21),
            None,
        ),
        (".//Studies/Study", "Has metadata", Some(22), None),
        (
            ".//MetaVariables/Submitter/Method",
            "Experimental method",
            Some(23),
            Some(".+"),
        ),
        (
            ".//Studies/Study[@source]",
            "established data repository",
            Some(24),
            None,
        ),
        (".//Documents/Document", "Downloadable", Some(25), None),
        // Versioning lives inside the accession number.
        (
            ".//Studies/Study[@accession]",
            "Has version information",
            Some(26),
            None,
        ),
        (".//DacInfo/DacEmail", "Has contact", Some(27), Some(".+@.+")),
        (".//Publications/Publication", "Citable", Some(28), None),
        (
            ".//AuthorizedAccess/Policy",
            "Usage Protocol/License",
            Some(29),
            None,
        ),
    ];

    rules
        .into_iter()
        .map(|(query, description, metric, pattern)| {
            ChecklistRule::new(query, description, metric, pattern)
        })
        .collect()
}

/// Parses `xml` and evaluates every rule against its root element.
pub fn evaluate_descriptor(rules: &[ChecklistRule], xml: &str) -> IngestResult<Vec<RuleOutcome>> {
    let mut options = roxmltree::ParsingOptions::default();
    options.allow_dtd = true;
    let document = roxmltree::Document::parse_with_options(xml, options)?;
    let root = document.root_element();
    Ok(rules.iter().map(|rule| rule.evaluate(root)).collect())
}

#[cfg(test)]
mod tests {
    use super::{dbgap_checklist, evaluate_descriptor, ChecklistRule, TITLE_RULE};
    use crate::ingest::IngestError;
    use crate::model::answer::AnswerValue;

    const DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GaPExchange>
  <Studies>
    <Study accession="phs000007.v30.p11" source="dbGaP">
      <Configuration>
        <StudyNameEntrez>  Framingham Cohort  </StudyNameEntrez>
        <Documents><Document id="1"/></Documents>
      </Configuration>
    </Study>
  </Studies>
  <DacInfo><DacEmail>not-an-address</DacEmail></DacInfo>
</GaPExchange>"#;

    fn outcome<'a>(outcomes: &'a [super::RuleOutcome], description: &str) -> &'a super::RuleOutcome {
        outcomes
            .iter()
            .find(|item| item.description == description)
            .unwrap()
    }

    #[test]
    fn dbgap_checklist_compiles_every_rule() {
        let rules = dbgap_checklist().unwrap();
        assert_eq!(rules.len(), 10);
        assert_eq!(rules[0].description, TITLE_RULE);
        assert_eq!(rules[0].metric, None);
        let metrics: Vec<_> = rules.iter().filter_map(|rule| rule.metric).collect();
        assert_eq!(metrics, (21..=29).collect::<Vec<_>>());
    }

    #[test]
    fn evaluates_presence_and_pattern_rules() {
        let rules = dbgap_checklist().unwrap();
        let outcomes = evaluate_descriptor(&rules, DESCRIPTOR).unwrap();

        let title = outcome(&outcomes, TITLE_RULE);
        assert_eq!(title.answer, AnswerValue::YES);
        assert_eq!(title.comment, "Framingham Cohort");

        let accession = outcome(&outcomes, "ID or accession number");
        assert_eq!(accession.answer, AnswerValue::YES);
        assert_eq!(accession.comment, ".//Studies/Study[@accession]");

        assert_eq!(outcome(&outcomes, "Downloadable").answer, AnswerValue::YES);
        assert_eq!(outcome(&outcomes, "Citable").answer, AnswerValue::NO);

        let contact = outcome(&outcomes, "Has contact");
        assert_eq!(contact.answer, AnswerValue::NO);
        assert_eq!(contact.comment, "not-an-address");

        let method = outcome(&outcomes, "Experimental method");
        assert_eq!(method.answer, AnswerValue::NO);
        assert_eq!(method.comment, "");
    }

    #[test]
    fn pattern_matches_only_at_start() {
        let rules = vec![ChecklistRule::new(".//Tag", "starts with a", Some(1), Some("a")).unwrap()];
        let yes = evaluate_descriptor(&rules, "<r><Tag>abc</Tag></r>").unwrap();
        assert_eq!(yes[0].answer, AnswerValue::YES);
        let no = evaluate_descriptor(&rules, "<r><Tag>bca</Tag></r>").unwrap();
        assert_eq!(no[0].answer, AnswerValue::NO);
    }

    #[test]
    fn textless_match_counts_as_empty_text() {
        let rules = dbgap_checklist().unwrap();
        let xml = "<GaPExchange><MetaVariables><Submitter><Method/></Submitter></MetaVariables></GaPExchange>";
        let outcomes = evaluate_descriptor(&rules, xml).unwrap();

        let method = outcome(&outcomes, "Experimental method");
        assert_eq!(method.answer, AnswerValue::NO);
        assert_eq!(method.comment, "");
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let rules = dbgap_checklist().unwrap();
        let err = evaluate_descriptor(&rules, "<GaPExchange><Studies>").unwrap_err();
        assert!(matches!(err, IngestError::Xml(_)));
    }

    #[test]
    fn invalid_rules_fail_to_compile() {
        assert!(matches!(
            ChecklistRule::new("/abs", "bad", None, None),
            Err(IngestError::Path(_))
        ));
        assert!(matches!(
            ChecklistRule::new(".//Tag", "bad", None, Some("(")),
            Err(IngestError::Pattern(_))
        ));
    }
}
