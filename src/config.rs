use serde::Deserialize;

/// How query operators are spelled when an expression is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStyle {
    /// `Include(a.Lists, b => b)`
    #[default]
    Short,
    /// `Microsoft.SharePoint.Client.ClientObjectQueryableExtension.Include(a.Lists, b => b)`
    Qualified,
}

/// Settings shared by every compilation.
///
/// Build one value up front and lend it to [`crate::ExpressionCompiler`]; nothing
/// in the crate keeps its own copy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Fully qualified name of the per-element inclusion function.
    pub include_function: String,
    /// Fully qualified name of the filtering function.
    pub where_function: String,
    /// Namespaces imported by rendered declarations.
    pub imports: Vec<String>,
    /// Parameter bound to the collection a filter runs over.
    pub filter_variable: String,
    pub style: RenderStyle,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            include_function: "Microsoft.SharePoint.Client.ClientObjectQueryableExtension.Include"
                .to_string(),
            where_function: "System.Linq.Queryable.Where".to_string(),
            imports: vec![
                "Microsoft.SharePoint.Client".to_string(),
                "System".to_string(),
                "System.Linq".to_string(),
                "System.Linq.Expressions".to_string(),
            ],
            filter_variable: "__filter_source".to_string(),
            style: RenderStyle::Short,
        }
    }
}

impl CompilerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Name written for `Include` calls under the configured style.
    pub fn include_name(&self) -> &str {
        match self.style {
            RenderStyle::Short => "Include",
            RenderStyle::Qualified => &self.include_function,
        }
    }

    /// Name written for `Where` calls under the configured style.
    pub fn where_name(&self) -> &str {
        match self.style {
            RenderStyle::Short => "Where",
            RenderStyle::Qualified => &self.where_function,
        }
    }
}
