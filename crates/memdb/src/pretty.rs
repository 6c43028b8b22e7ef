use crate::schema::Table;
use tabled::{Table as Grid, builder::Builder, settings};

/// Predefined output styles that map to `tabled` styles.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TableStyleKind {
    #[default]
    Modern,
    Ascii,
    Plain,
}

impl TableStyleKind {
    fn apply(self, grid: &mut Grid) {
        match self {
            Self::Modern => grid.with(settings::Style::modern()),
            Self::Ascii => grid.with(settings::Style::ascii()),
            Self::Plain => grid.with(settings::Style::empty()),
        };
    }
}

/// Render a table's rows under its column headers, in schema order.
pub fn render_table(table: &Table, style: TableStyleKind) -> String {
    let columns = table.schema.columns();
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.name.clone()));

    for row in table.rows() {
        builder.push_record(
            columns
                .iter()
                .map(|c| row.get(&c.name).map_or_else(|| "NULL".into(), ToString::to_string)),
        );
    }

    let mut grid = builder.build();
    style.apply(&mut grid);
    grid.to_string()
}
