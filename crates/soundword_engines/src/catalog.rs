#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use soundword_kernel_contracts::catalog::{
    Category, SeedId, StimulusRecord, Word, WordType, CATALOG_COLUMNS,
};

use crate::DesignError;

/// Immutable stimulus catalog, scoped to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusCatalog {
    records: Vec<StimulusRecord>,
}

impl StimulusCatalog {
    pub fn new(records: Vec<StimulusRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[StimulusRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows whose `word_type` equals `selector`. Returns a new catalog.
    pub fn filter_word_type(&self, selector: &WordType) -> StimulusCatalog {
        StimulusCatalog::new(
            self.records
                .iter()
                .filter(|r| &r.word_type == selector)
                .cloned()
                .collect(),
        )
    }

    pub fn categories(&self) -> Vec<Category> {
        let set: BTreeSet<&Category> = self.records.iter().map(|r| &r.category).collect();
        set.into_iter().cloned().collect()
    }

    /// Distinct seeds per category, each list sorted.
    pub fn seeds_by_category(&self) -> BTreeMap<Category, Vec<SeedId>> {
        let mut out: BTreeMap<Category, BTreeSet<SeedId>> = BTreeMap::new();
        for r in &self.records {
            out.entry(r.category.clone())
                .or_default()
                .insert(r.seed_id.clone());
        }
        out.into_iter()
            .map(|(c, seeds)| (c, seeds.into_iter().collect()))
            .collect()
    }

    /// Distinct candidate labels per category, each list sorted.
    pub fn words_by_category(&self) -> BTreeMap<Category, Vec<(Word, WordType)>> {
        let mut out: BTreeMap<Category, BTreeSet<(Word, WordType)>> = BTreeMap::new();
        for r in &self.records {
            out.entry(r.category.clone())
                .or_default()
                .insert((r.word.clone(), r.word_type.clone()));
        }
        out.into_iter()
            .map(|(c, words)| (c, words.into_iter().collect()))
            .collect()
    }

    pub fn distinct_seeds(&self) -> Vec<SeedId> {
        let set: BTreeSet<&SeedId> = self.records.iter().map(|r| &r.seed_id).collect();
        set.into_iter().cloned().collect()
    }
}

/// Parses the catalog table. Columns are located by header name; extra columns are ignored.
/// `word_category` is accepted as an alias of `category`.
pub fn parse_catalog_csv(text: &str) -> Result<StimulusCatalog, DesignError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| !l.trim().is_empty());

    let (header_line, header) = lines.next().ok_or(DesignError::EmptyCatalog)?;
    let header = split_csv_line(header).map_err(|reason| DesignError::CatalogParse {
        line: header_line,
        reason,
    })?;
    let mut ix = [0usize; 4];
    for (slot, name) in ix.iter_mut().zip(CATALOG_COLUMNS) {
        *slot = header
            .iter()
            .position(|h| h.trim() == name || (name == "category" && h.trim() == "word_category"))
            .ok_or_else(|| DesignError::CatalogParse {
                line: header_line,
                reason: format!("missing column {name}"),
            })?;
    }

    let mut records = Vec::new();
    for (line, raw) in lines {
        let fields =
            split_csv_line(raw).map_err(|reason| DesignError::CatalogParse { line, reason })?;
        let record = StimulusRecord::v1(
            SeedId::new(field_at(&fields, ix[0], line)?)?,
            Category::new(field_at(&fields, ix[1], line)?)?,
            Word::new(field_at(&fields, ix[2], line)?)?,
            WordType::new(field_at(&fields, ix[3], line)?)?,
        )?;
        records.push(record);
    }
    if records.is_empty() {
        return Err(DesignError::EmptyCatalog);
    }
    Ok(StimulusCatalog::new(records))
}

fn field_at(fields: &[String], i: usize, line: usize) -> Result<&str, DesignError> {
    fields
        .get(i)
        .map(|s| s.trim())
        .ok_or_else(|| DesignError::CatalogParse {
            line,
            reason: format!("expected at least {} fields, got {}", i + 1, fields.len()),
        })
}

/// Splits one CSV line, honoring double-quoted fields with `""` escapes.
pub fn split_csv_line(line: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;
    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if cur.is_empty() => in_quotes = true,
            (',', false) => out.push(std::mem::take(&mut cur)),
            (c, _) => cur.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    out.push(cur);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
seed_id,category,word,word_type,extra
s1,glass,tink,sound,x
s1,glass,clink,sound,x
s2,water,drip,sound,x
s2,water,\"plop, plop\",sound,x
s3,water,blub,name,x
";

    #[test]
    fn parses_rows_and_ignores_extra_columns() {
        let cat = parse_catalog_csv(SAMPLE).unwrap();
        assert_eq!(cat.len(), 5);
        assert_eq!(cat.records()[3].word.as_str(), "plop, plop");
        assert_eq!(
            cat.categories()
                .iter()
                .map(Category::as_str)
                .collect::<Vec<_>>(),
            vec!["glass", "water"]
        );
    }

    #[test]
    fn filter_by_word_type_returns_new_catalog() {
        let cat = parse_catalog_csv(SAMPLE).unwrap();
        let sound = cat.filter_word_type(&WordType::new("sound").unwrap());
        assert_eq!(sound.len(), 4);
        assert_eq!(cat.len(), 5);
        let seeds = sound.seeds_by_category();
        assert_eq!(seeds[&Category::new("water").unwrap()].len(), 1);
    }

    #[test]
    fn words_are_distinct_per_category() {
        let cat = parse_catalog_csv(SAMPLE).unwrap();
        let words = cat.words_by_category();
        assert_eq!(words[&Category::new("glass").unwrap()].len(), 2);
        assert_eq!(words[&Category::new("water").unwrap()].len(), 3);
    }

    #[test]
    fn word_category_header_is_accepted() {
        let cat = parse_catalog_csv("word_category,seed_id,word,word_type\nglass,s1,tink,sound\n")
            .unwrap();
        assert_eq!(cat.records()[0].category.as_str(), "glass");
        assert_eq!(cat.records()[0].seed_id.as_str(), "s1");
    }

    #[test]
    fn missing_column_and_short_rows_are_reported_with_line_numbers() {
        assert!(matches!(
            parse_catalog_csv("seed_id,category,word\ns1,glass,tink\n"),
            Err(DesignError::CatalogParse { line: 1, .. })
        ));
        assert!(matches!(
            parse_catalog_csv("seed_id,category,word,word_type\ns1,glass\n"),
            Err(DesignError::CatalogParse { line: 2, .. })
        ));
        assert_eq!(
            parse_catalog_csv("seed_id,category,word,word_type\n"),
            Err(DesignError::EmptyCatalog)
        );
    }

    #[test]
    fn split_handles_escaped_quotes() {
        assert_eq!(
            split_csv_line(r#"a,"b ""c""",d"#).unwrap(),
            vec!["a", r#"b "c""#, "d"]
        );
        assert!(split_csv_line("\"open").is_err());
    }
}
