use crate::error::app_error::AppError;
use crate::models::product::Product;

pub const PRODUCT_HEADER: &str = "name,sku,oem_number,category_slug,summary,is_active";

/// Quote a field when it contains a delimiter, quote, or newline; embedded
/// quotes are doubled.
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render the product list as a CSV snapshot, one row per product.
pub fn format_products(products: &[Product]) -> String {
    let mut csv = String::new();
    csv.push_str(PRODUCT_HEADER);
    csv.push('\n');

    for product in products {
        let row = [
            escape_field(&product.name),
            escape_field(&product.sku),
            escape_field(&product.oem_number),
            escape_field(product.category_name.as_deref().unwrap_or("")),
            escape_field(product.summary.as_deref().unwrap_or("")),
            if product.is_active { "true".to_string() } else { "false".to_string() },
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }

    csv
}

/// Parse CSV text into rows of fields, honoring quoted fields with embedded
/// delimiters, doubled quotes, and either line ending. Blank lines are
/// skipped.
pub fn parse(body: &str) -> Result<Vec<Vec<String>>, AppError> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = body.chars().peekable();
    let mut line_has_content = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                line_has_content = true;
            }
            '"' => return Err(AppError::BadRequest("Unexpected quote inside unquoted CSV field".to_string())),
            ',' => {
                fields.push(std::mem::take(&mut field));
                line_has_content = true;
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                end_line(&mut rows, &mut fields, &mut field, &mut line_has_content);
            }
            '\n' => end_line(&mut rows, &mut fields, &mut field, &mut line_has_content),
            _ => {
                field.push(c);
                line_has_content = true;
            }
        }
    }

    if in_quotes {
        return Err(AppError::BadRequest("Unterminated quoted CSV field".to_string()));
    }
    end_line(&mut rows, &mut fields, &mut field, &mut line_has_content);

    Ok(rows)
}

fn end_line(rows: &mut Vec<Vec<String>>, fields: &mut Vec<String>, field: &mut String, line_has_content: &mut bool) {
    if *line_has_content || !fields.is_empty() {
        fields.push(std::mem::take(field));
        rows.push(std::mem::take(fields));
    }
    field.clear();
    *line_has_content = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn product(name: &str, sku: &str, summary: Option<&str>) -> Product {
        Product {
            id: Uuid::new_v4(),
            category_id: None,
            category_name: Some("brakes".to_string()),
            name: name.to_string(),
            sku: sku.to_string(),
            oem_number: "OEM-1".to_string(),
            summary: summary.map(String::from),
            is_active: true,
            created_at: Utc::now(),
            images: Vec::new(),
        }
    }

    #[test]
    fn escape_passes_plain_fields_through() {
        assert_eq!(escape_field("brake pads"), "brake pads");
    }

    #[test]
    fn escape_quotes_delimiters_and_doubles_quotes() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn format_emits_header_and_rows() {
        let csv = format_products(&[product("Pad Set", "BP-1", Some("Good, cheap"))]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(PRODUCT_HEADER));
        assert_eq!(lines.next(), Some("Pad Set,BP-1,OEM-1,brakes,\"Good, cheap\",true"));
    }

    #[test]
    fn parse_handles_quoted_fields() {
        let rows = parse("a,\"b,c\",d\n").expect("parse");
        assert_eq!(rows, vec![vec!["a".to_string(), "b,c".to_string(), "d".to_string()]]);
    }

    #[test]
    fn parse_handles_doubled_quotes_and_crlf() {
        let rows = parse("\"say \"\"hi\"\"\",x\r\ny,z").expect("parse");
        assert_eq!(rows[0], vec!["say \"hi\"".to_string(), "x".to_string()]);
        assert_eq!(rows[1], vec!["y".to_string(), "z".to_string()]);
    }

    #[test]
    fn parse_skips_blank_lines() {
        let rows = parse("a,b\n\n\nc,d\n").expect("parse");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn parse_rejects_unterminated_quote() {
        assert!(parse("\"never closed").is_err());
    }

    #[test]
    fn format_then_parse_round_trips_hostile_values() {
        let hostile = product("Name, with \"quotes\"", "SKU\n1", None);
        let csv = format_products(&[hostile]);
        let rows = parse(&csv).expect("parse");
        assert_eq!(rows[1][0], "Name, with \"quotes\"");
        assert_eq!(rows[1][1], "SKU\n1");
    }
}
