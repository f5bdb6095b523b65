//! Editable certificate design: fields plus the dataset bound to them
//!
//! This is the model behind an editor. Every field edit keeps the dataset's
//! columns in step with the field names.

use crate::dataset::Dataset;
use crate::parser::field_names;
use crate::{Result, TemplateError, TextField};

/// Prefix of generated field names
pub const FIELD_NAME_PREFIX: &str = "Text-";

#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    pub fields: Vec<TextField>,
    pub dataset: Dataset,
}

impl Default for Design {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Design {
    /// A design over `fields` with a single blank data row
    pub fn new(fields: Vec<TextField>) -> Self {
        let dataset = Dataset::new(field_names(&fields));
        Self { fields, dataset }
    }

    /// A design over `fields` and existing data
    pub fn with_dataset(fields: Vec<TextField>, mut dataset: Dataset) -> Self {
        dataset.sync_columns(field_names(&fields));
        Self { fields, dataset }
    }

    pub fn field(&self, name: &str) -> Option<&TextField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First unused `Text-N` name, counting from 1
    pub fn next_field_name(&self) -> String {
        (1..)
            .map(|n| format!("{FIELD_NAME_PREFIX}{n}"))
            .find(|name| self.field(name).is_none())
            .unwrap_or_default()
    }

    /// Add a field, creating its dataset column
    pub fn add_field(&mut self, field: TextField) -> Result<()> {
        if field.name.trim().is_empty() {
            return Err(TemplateError::FieldError("field name is empty".to_string()));
        }
        if self.field(&field.name).is_some() {
            return Err(TemplateError::FieldError(format!(
                "duplicate field name '{}'",
                field.name
            )));
        }
        self.fields.push(field);
        self.dataset.sync_columns(field_names(&self.fields));
        Ok(())
    }

    /// Rename a field and its dataset column
    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<()> {
        self.update_field(old, |field| field.name = new.to_string())
    }

    /// Edit a field in place
    ///
    /// A name change made by `edit` is validated and carried over to the
    /// dataset; an invalid change leaves the field untouched.
    pub fn update_field<F>(&mut self, name: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut TextField),
    {
        let index = self
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| TemplateError::FieldError(format!("no field named '{name}'")))?;

        let mut edited = self.fields[index].clone();
        edit(&mut edited);

        if edited.name != name {
            if edited.name.trim().is_empty() {
                return Err(TemplateError::FieldError("field name is empty".to_string()));
            }
            if self.field(&edited.name).is_some() {
                return Err(TemplateError::FieldError(format!(
                    "duplicate field name '{}'",
                    edited.name
                )));
            }
            self.dataset.rename_column(name, &edited.name);
        }

        self.fields[index] = edited;
        self.dataset.sync_columns(field_names(&self.fields));
        Ok(())
    }

    /// Remove a field and its dataset column
    pub fn remove_field(&mut self, name: &str) -> Option<TextField> {
        let index = self.fields.iter().position(|f| f.name == name)?;
        let field = self.fields.remove(index);
        self.dataset.remove_column(name);
        Some(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::row_value;
    use crate::Align;
    use pretty_assertions::assert_eq;

    fn names(design: &Design) -> Vec<&str> {
        design.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_next_field_name_fills_gaps() {
        let mut design = Design::default();
        assert_eq!(design.next_field_name(), "Text-1");

        design.add_field(TextField::new("Text-1", 0.0, 0.0)).unwrap();
        design.add_field(TextField::new("Text-3", 0.0, 0.0)).unwrap();
        assert_eq!(design.next_field_name(), "Text-2");
    }

    #[test]
    fn test_add_field_creates_column() {
        let mut design = Design::default();
        design.add_field(TextField::new("Name", 10.0, 10.0)).unwrap();

        assert_eq!(design.dataset.columns, vec!["Name".to_string()]);
        assert_eq!(row_value(&design.dataset.rows[0], "Name"), "");
    }

    #[test]
    fn test_add_duplicate_rejected() {
        let mut design = Design::new(vec![TextField::new("Name", 0.0, 0.0)]);
        let result = design.add_field(TextField::new("Name", 5.0, 5.0));
        assert!(matches!(result, Err(TemplateError::FieldError(_))));
        assert_eq!(design.fields.len(), 1);
    }

    #[test]
    fn test_rename_field_moves_data() {
        let mut design = Design::new(vec![TextField::new("Name", 0.0, 0.0)]);
        design.dataset.rows[0].insert("Name".into(), "Ada".into());

        design.rename_field("Name", "Recipient").unwrap();
        assert_eq!(names(&design), vec!["Recipient"]);
        assert_eq!(design.dataset.columns, vec!["Recipient".to_string()]);
        assert_eq!(row_value(&design.dataset.rows[0], "Recipient"), "Ada");
        assert_eq!(design.dataset.rows[0].get("Name"), None);
    }

    #[test]
    fn test_rename_to_existing_name_fails() {
        let mut design = Design::new(vec![TextField::new("A", 0.0, 0.0), TextField::new("B", 0.0, 0.0)]);
        assert!(design.rename_field("A", "B").is_err());
        assert!(design.rename_field("A", "  ").is_err());
        assert!(design.rename_field("Z", "C").is_err());
        assert_eq!(names(&design), vec!["A", "B"]);
    }

    #[test]
    fn test_update_field_styles() {
        let mut design = Design::new(vec![TextField::new("Name", 0.0, 0.0)]);
        design
            .update_field("Name", |f| {
                f.align = Align::Center;
                f.box_width = 400.0;
            })
            .unwrap();

        let field = design.field("Name").unwrap();
        assert_eq!(field.align, Align::Center);
        assert_eq!(field.box_width, 400.0);
    }

    #[test]
    fn test_with_dataset_adds_missing_columns() {
        let dataset = Dataset::from_csv_reader("Name\nAda\n".as_bytes(), vec!["Name".into()]).unwrap();
        let design = Design::with_dataset(
            vec![TextField::new("Name", 0.0, 0.0), TextField::new("Date", 0.0, 0.0)],
            dataset,
        );
        assert_eq!(design.dataset.columns, vec!["Name".to_string(), "Date".to_string()]);
        assert_eq!(row_value(&design.dataset.rows[0], "Name"), "Ada");
        assert_eq!(design.dataset.rows[0].get("Date"), Some(&String::new()));
    }

    #[test]
    fn test_remove_field_drops_column() {
        let mut design = Design::new(vec![TextField::new("A", 0.0, 0.0), TextField::new("B", 0.0, 0.0)]);
        let removed = design.remove_field("A").unwrap();

        assert_eq!(removed.name, "A");
        assert_eq!(design.dataset.columns, vec!["B".to_string()]);
        assert_eq!(design.dataset.rows[0].get("A"), None);
        assert_eq!(design.remove_field("A"), None);
    }
}
