use core::fmt::{self, Display, Write};

use crate::{cell, error::Error, layout::RowLayout, table::Table, types::CellType};

impl Table {
    /// Renders the rows as delimiter separated text, rows joined by `\r\n`.
    ///
    /// Floats are printed with `decimals` digits, `Char` cells as a character and every other
    /// numeric cell as a decimal integer. Fields are never quoted.
    pub fn to_csv(&self, separator: char, decimals: usize) -> Result<String, Error> {
        if !separator.is_ascii() {
            return Err(Error::InvalidSeparator(separator));
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(separator as u8)
            .terminator(csv::Terminator::CRLF)
            .quote_style(csv::QuoteStyle::Never)
            .has_headers(false)
            .from_writer(Vec::new());

        let mut field = String::new();
        for row in self.iter() {
            for cell in row.cells() {
                field.clear();
                cell.write_text(&mut field, decimals)?;
                writer.write_field(&field)?;
            }
            writer.write_record(None::<&[u8]>)?;
        }

        let mut bytes = writer.into_inner().map_err(|err| err.into_error())?;
        if bytes.ends_with(b"\r\n") {
            bytes.truncate(bytes.len() - 2);
        }
        String::from_utf8(bytes).map_err(|err| err.utf8_error().into())
    }

    /// Writes a tab separated listing: type names, then one numbered line per row.
    pub fn dump(&self, out: &mut impl Write) -> fmt::Result {
        write_dump_header(out, self.types())?;
        for row in self.iter() {
            write_dump_row(out, self.layout(), row.index(), row.as_bytes())?;
        }
        Ok(())
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f)
    }
}

pub(crate) fn write_dump_header(out: &mut impl Write, types: &[CellType]) -> fmt::Result {
    out.write_char('\t')?;
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            out.write_char('\t')?;
        }
        write!(out, "{ty}")?;
    }
    out.write_char('\n')
}

pub(crate) fn write_dump_row(
    out: &mut impl Write,
    layout: &RowLayout,
    index: usize,
    row: &[u8],
) -> fmt::Result {
    write!(out, "{index}.\t")?;
    for (col, ty) in layout.types().iter().enumerate() {
        if let Some(range) = layout.cell_range(0, col) {
            cell::write_text(out, *ty, &row[range], 2)?;
        }
        out.write_char('\t')?;
    }
    out.write_char('\n')
}

#[cfg(test)]
mod tests {
    use crate::{CellType, Table, Value};

    #[test]
    fn test_csv_formats() {
        let mut table =
            Table::with_columns(&[CellType::Float, CellType::Char, CellType::Int8, CellType::Unix])
                .unwrap();
        table
            .append(&[Value::Float(1.5), Value::Uint(b'x' as u64), Value::Int(-4), Value::Uint(1_700_000_000)])
            .unwrap();
        table.append(&[Value::Float(-0.25)]).unwrap();
        assert_eq!(
            table.to_csv(',', 3).unwrap(),
            "1.500,x,-4,1700000000\r\n-0.250,\0,0,0"
        );
        assert_eq!(Table::new().to_csv(',', 2).unwrap(), "");
        assert!(matches!(
            table.to_csv('§', 2),
            Err(crate::Error::InvalidSeparator('§'))
        ));
        assert_eq!(
            table.to_csv('\t', 2).unwrap(),
            "1.50\tx\t-4\t1700000000\r\n-0.25\t\0\t0\t0"
        );
    }

    #[test]
    fn test_dump() {
        let mut table = Table::with_columns(&[CellType::Int16, CellType::Char8]).unwrap();
        table.append(&[10.into(), "ab".into()]).unwrap();
        table.append(&[20.into(), "cd".into()]).unwrap();
        assert_eq!(
            table.to_string(),
            "\tInt16\tChar8\n0.\t10\tab\t\n1.\t20\tcd\t\n"
        );
    }
}
