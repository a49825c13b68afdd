use std::fmt;

use crate::relation::Relation;

pub const COLUMN_WIDTH: usize = 20;

/// Renders a bordered table: a band with the relation's name, the field
/// names, then one row per tuple. Values longer than a column are not cut.
impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner_width = (self.arity() * (COLUMN_WIDTH + 1)).saturating_sub(1);
        let column_border = format!(
            "+{}",
            format!("{}+", "-".repeat(COLUMN_WIDTH)).repeat(self.arity())
        );

        writeln!(f, "+{}+", "-".repeat(inner_width))?;
        writeln!(f, "|{:<width$}|", self.name(), width = inner_width)?;
        writeln!(f, "{}", column_border)?;
        write_row(f, self.fields())?;
        for tuple in self.tuples() {
            write_row(f, tuple)?;
        }
        writeln!(f, "{}", column_border)
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, values: &[String]) -> fmt::Result {
    f.write_str("|")?;
    for value in values {
        write!(f, "{:<width$}|", value, width = COLUMN_WIDTH)?;
    }
    writeln!(f)
}
