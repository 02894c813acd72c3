//! Catalog command for growtrack.
//!
//! Read-only queries against the strain and fertilizer catalogs.

use serde::Serialize;

use crate::catalog::{Catalogs, FertilizerProduct, StrainInfo};

/// Options for the catalog command.
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of search results.
    pub limit: Option<usize>,
}

/// A strain hit with its manufacturer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StrainHit {
    pub manufacturer: String,
    #[serde(flatten)]
    pub strain: StrainInfo,
}

/// Output format for the catalog command.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogOutput {
    /// Whether the query matched anything.
    pub success: bool,
    pub strains: Vec<StrainHit>,
    pub products: Vec<FertilizerProduct>,
    /// Error message if nothing matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CatalogOutput {
    fn strains(strains: Vec<StrainHit>) -> Self {
        Self {
            success: true,
            strains,
            products: Vec::new(),
            error: None,
        }
    }

    fn products(products: Vec<FertilizerProduct>) -> Self {
        Self {
            success: true,
            strains: Vec::new(),
            products,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            strains: Vec::new(),
            products: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The catalog command implementation.
pub struct CatalogCommand {
    catalogs: Catalogs,
}

impl CatalogCommand {
    /// Create a new catalog command.
    pub fn new(catalogs: Catalogs) -> Self {
        Self { catalogs }
    }

    /// Exact strain lookup, ignoring case.
    pub fn lookup(&self, manufacturer: &str, strain: &str) -> CatalogOutput {
        match self.catalogs.strains.lookup(manufacturer, strain) {
            Some(info) => CatalogOutput::strains(vec![StrainHit {
                manufacturer: manufacturer.to_string(),
                strain: info.clone(),
            }]),
            None => CatalogOutput::failure(format!(
                "no strain '{}' from '{}' in catalog",
                strain, manufacturer
            )),
        }
    }

    /// Strains whose name contains `query`.
    pub fn search(&self, query: &str, options: &CatalogOptions) -> CatalogOutput {
        let hits: Vec<StrainHit> = self
            .catalogs
            .strains
            .search(query, options.limit.unwrap_or(10))
            .into_iter()
            .map(|hit| StrainHit {
                manufacturer: hit.manufacturer.to_string(),
                strain: hit.strain.clone(),
            })
            .collect();
        if hits.is_empty() {
            return CatalogOutput::failure(format!("no strains matching '{}'", query));
        }
        CatalogOutput::strains(hits)
    }

    /// Strains of one manufacturer.
    pub fn strains_of(&self, manufacturer: &str) -> CatalogOutput {
        let hits: Vec<StrainHit> = self
            .catalogs
            .strains
            .strains_of(manufacturer)
            .into_iter()
            .map(|s| StrainHit {
                manufacturer: manufacturer.to_string(),
                strain: s.clone(),
            })
            .collect();
        if hits.is_empty() {
            return CatalogOutput::failure(format!("unknown seed manufacturer '{}'", manufacturer));
        }
        CatalogOutput::strains(hits)
    }

    /// Fertilizer products of one manufacturer, or a single product.
    pub fn fertilizers(&self, manufacturer: &str, product: Option<&str>) -> CatalogOutput {
        let fertilizers = &self.catalogs.fertilizers;
        let products: Vec<FertilizerProduct> = match product {
            Some(name) => fertilizers.lookup(manufacturer, name).cloned().into_iter().collect(),
            None => fertilizers.products_of(manufacturer).into_iter().cloned().collect(),
        };
        if products.is_empty() {
            return CatalogOutput::failure(match product {
                Some(name) => format!("no product '{}' from '{}' in catalog", name, manufacturer),
                None => format!("unknown fertilizer manufacturer '{}'", manufacturer),
            });
        }
        CatalogOutput::products(products)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &CatalogOutput, options: &CatalogOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    fn format_human_readable(&self, output: &CatalogOutput) -> String {
        if !output.success {
            return format!("{}\n", output.error.as_deref().unwrap_or("no match"));
        }

        let mut lines = Vec::new();
        for hit in &output.strains {
            lines.push(format!(
                "{} / {} - THC {}%, CBD {}%, {}",
                hit.manufacturer,
                hit.strain.name,
                hit.strain.thc_content,
                hit.strain.cbd_content,
                hit.strain.plant_type.display_name()
            ));
        }
        for product in &output.products {
            let npk = product
                .npk
                .as_deref()
                .map(|n| format!(" NPK {}", n))
                .unwrap_or_default();
            lines.push(format!("{} ({}){}", product.name, product.category, npk));
        }
        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd() -> CatalogCommand {
        CatalogCommand::new(Catalogs::builtin())
    }

    #[test]
    fn test_lookup_ignores_case() {
        let output = cmd().lookup("royal queen seeds", "AMNESIA HAZE");
        assert!(output.success);
        assert_eq!(output.strains[0].strain.thc_content, "22");
        assert_eq!(output.strains[0].strain.cbd_content, "0.8");
    }

    #[test]
    fn test_lookup_miss() {
        let output = cmd().lookup("Royal Queen Seeds", "Nonexistent Kush");
        assert!(!output.success);
    }

    #[test]
    fn test_search_by_substring() {
        let output = cmd().search("haze", &CatalogOptions::default());
        assert!(output.success);
        assert!(output
            .strains
            .iter()
            .all(|h| h.strain.name.to_lowercase().contains("haze")));

        let limited = cmd().search(
            "a",
            &CatalogOptions {
                limit: Some(1),
                ..Default::default()
            },
        );
        assert_eq!(limited.strains.len(), 1);
    }

    #[test]
    fn test_strains_of_unknown_manufacturer() {
        assert!(!cmd().strains_of("Nobody Seeds").success);
        assert!(cmd().strains_of("Royal Queen Seeds").success);
    }

    #[test]
    fn test_fertilizers() {
        let catalogs = Catalogs::builtin();
        let manufacturer = catalogs.fertilizers.manufacturers()[0].name.clone();
        let product = catalogs.fertilizers.manufacturers()[0].products[0].name.clone();
        let cmd = CatalogCommand::new(catalogs);

        let all = cmd.fertilizers(&manufacturer, None);
        assert!(all.success);
        assert!(!all.products.is_empty());

        let one = cmd.fertilizers(&manufacturer, Some(&product));
        assert_eq!(one.products.len(), 1);
        assert!(!cmd.fertilizers(&manufacturer, Some("Snake Oil")).success);
    }

    #[test]
    fn test_format_output_json_flattens_strain() {
        let c = cmd();
        let output = c.lookup("Royal Queen Seeds", "Amnesia Haze");
        let json = CatalogOptions {
            json: true,
            ..Default::default()
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&c.format_output(&output, &json)).unwrap();
        assert_eq!(parsed["strains"][0]["name"], "Amnesia Haze");
        assert_eq!(parsed["strains"][0]["manufacturer"], "Royal Queen Seeds");
    }
}
