use crate::error::KiraError;

pub const SAMPLE_ID: &str = "Sample_Id";
pub const HUGO_SYMBOL: &str = "Hugo_Symbol";
pub const ENTREZ_GENE_ID: &str = "Entrez_Gene_Id";
pub const CELL_TYPE: &str = "Cell_Type";
pub const TISSUE: &str = "Tissue";
pub const EXPRESSION_VALUE: &str = "Expression_Value";

/// Column positions of one input file, resolved from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub sample_id: usize,
    pub hugo_symbol: Option<usize>,
    pub entrez_gene_id: Option<usize>,
    pub cell_type: usize,
    pub tissue: usize,
    pub expression_value: usize,
}

/// Position of `name` in `header`, compared case-insensitively.
pub fn column_index(header: &[&str], name: &str) -> Option<usize> {
    header
        .iter()
        .position(|column| column.eq_ignore_ascii_case(name))
}

impl ColumnLayout {
    /// Resolves every known column and fails with one error naming all the
    /// missing ones.
    pub fn from_header(header: &[&str]) -> Result<Self, KiraError> {
        let mut missing = Vec::new();

        let sample_id = column_index(header, SAMPLE_ID);
        if sample_id.is_none() {
            missing.push(format!("'{SAMPLE_ID}'"));
        }
        let hugo_symbol = column_index(header, HUGO_SYMBOL);
        let entrez_gene_id = column_index(header, ENTREZ_GENE_ID);
        if hugo_symbol.is_none() && entrez_gene_id.is_none() {
            missing.push(format!("'{HUGO_SYMBOL}' or '{ENTREZ_GENE_ID}'"));
        }
        let cell_type = column_index(header, CELL_TYPE);
        if cell_type.is_none() {
            missing.push(format!("'{CELL_TYPE}'"));
        }
        let tissue = column_index(header, TISSUE);
        if tissue.is_none() {
            missing.push(format!("'{TISSUE}'"));
        }
        let expression_value = column_index(header, EXPRESSION_VALUE);
        if expression_value.is_none() {
            missing.push(format!("'{EXPRESSION_VALUE}'"));
        }

        match (sample_id, cell_type, tissue, expression_value) {
            (Some(sample_id), Some(cell_type), Some(tissue), Some(expression_value))
                if missing.is_empty() =>
            {
                Ok(Self {
                    sample_id,
                    hugo_symbol,
                    entrez_gene_id,
                    cell_type,
                    tissue,
                    expression_value,
                })
            }
            _ => Err(KiraError::MissingColumns(missing.join(", "))),
        }
    }

    /// Smallest number of fields a data line needs to cover every column.
    pub fn min_fields(&self) -> usize {
        [
            Some(self.sample_id),
            self.hugo_symbol,
            self.entrez_gene_id,
            Some(self.cell_type),
            Some(self.tissue),
            Some(self.expression_value),
        ]
        .into_iter()
        .flatten()
        .max()
        .map(|index| index + 1)
        .unwrap_or(0)
    }

    /// Picks this layout's columns out of a split data line.
    ///
    /// Returns `None` when the line is too short. Absent gene columns read
    /// as empty text.
    pub fn fields<'a>(&self, parts: &[&'a str]) -> Option<RowFields<'a>> {
        if parts.len() < self.min_fields() {
            return None;
        }
        let optional = |index: Option<usize>| index.map(|index| parts[index]).unwrap_or("");
        Some(RowFields {
            sample_id: parts[self.sample_id],
            hugo_symbol: optional(self.hugo_symbol),
            entrez_gene_id: optional(self.entrez_gene_id),
            cell_type: parts[self.cell_type],
            tissue: parts[self.tissue],
            expression_value: parts[self.expression_value],
        })
    }
}

/// Raw text of the columns the importer cares about, borrowed from a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowFields<'a> {
    pub sample_id: &'a str,
    pub hugo_symbol: &'a str,
    pub entrez_gene_id: &'a str,
    pub cell_type: &'a str,
    pub tissue: &'a str,
    pub expression_value: &'a str,
}
