//! Wire constants and readers shared by the builder, validator and response parsers.

use crate::error::{BillingError, BillingResult};
use crate::models::{Glosa, GuideVariant};
use crate::money::parse_money;
use integrity_engine::tree::Element;
use rust_decimal::Decimal;
use tracing::debug;

pub const TISS_NAMESPACE: &str = "http://www.ans.gov.br/padroes/tiss/schemas";
pub const TISS_PREFIX: &str = "ans";
pub const WIRE_ENCODING: &str = "ISO-8859-1";
pub const ROOT_ELEMENT: &str = "mensagemTISS";
pub const VERSION_ELEMENT: &str = "Padrao";

/// Element names of every guide variant
pub fn guide_elements() -> impl Iterator<Item = &'static str> {
    GuideVariant::ALL.into_iter().map(|v| v.element())
}

/// Every glosa record below `element`.
///
/// A record is any element with a direct `codigoGlosa` child. Its description and item
/// references are read from siblings of that child, then from the enclosing item and guide, so
/// payers that put the guide number on the guide are covered. A value on the record itself wins;
/// a value on an enclosing element belongs to the first record below it only, so sibling codes
/// sharing one item value never count it twice.
pub fn read_glosas(element: &Element) -> BillingResult<Vec<Glosa>> {
    let mut glosas = Vec::new();
    let mut ancestors = Vec::new();
    collect_glosas(element, &mut ancestors, &mut glosas)?;
    Ok(glosas)
}

struct Frame<'a> {
    element: &'a Element,
    value_claimed: bool,
}

fn own_text(element: &Element, name: &str) -> Option<String> {
    element
        .child(name)
        .map(|e| e.text.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn collect_glosas<'a>(
    element: &'a Element,
    ancestors: &mut Vec<Frame<'a>>,
    out: &mut Vec<Glosa>,
) -> BillingResult<()> {
    if let Some(code) = element.child("codigoGlosa") {
        let value_text = match own_text(element, "valorGlosa") {
            Some(text) => Some(text),
            None => match ancestors
                .iter_mut()
                .rev()
                .find(|frame| own_text(frame.element, "valorGlosa").is_some())
            {
                Some(frame) if !frame.value_claimed => {
                    frame.value_claimed = true;
                    own_text(frame.element, "valorGlosa")
                }
                Some(_) => {
                    debug!(code = %code.text, "enclosing glosa value already attributed");
                    None
                }
                None => None,
            },
        };
        let rejected_value = match value_text {
            Some(text) => parse_money(&text).map_err(|_| BillingError::InvalidMoney(text))?,
            None => Decimal::ZERO,
        };

        let lookup = |name: &str| -> Option<String> {
            std::iter::once(element)
                .chain(ancestors.iter().rev().map(|frame| frame.element))
                .find_map(|e| own_text(e, name))
        };

        out.push(Glosa {
            code: code.text.clone(),
            description: lookup("descricaoGlosa")
                .or_else(|| lookup("descricaoMotivoGlosa"))
                .unwrap_or_default(),
            rejected_value,
            guide_number: lookup("numeroGuiaPrestador"),
            item_sequence: lookup("sequencialItem").and_then(|s| s.parse().ok()),
            procedure_code: lookup("codigoProcedimento"),
        });
        return Ok(());
    }

    ancestors.push(Frame {
        element,
        value_claimed: false,
    });
    for child in &element.children {
        collect_glosas(child, ancestors, out)?;
    }
    ancestors.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use integrity_engine::tree;

    #[test]
    fn test_read_glosas_from_items() {
        let doc = r#"<ans:retorno xmlns:ans="http://www.ans.gov.br/padroes/tiss/schemas">
            <ans:guia>
                <ans:numeroGuiaPrestador>G1</ans:numeroGuiaPrestador>
                <ans:item>
                    <ans:sequencialItem>2</ans:sequencialItem>
                    <ans:codigoProcedimento>40301630</ans:codigoProcedimento>
                    <ans:valorGlosa>40,00</ans:valorGlosa>
                    <ans:motivoGlosa>
                        <ans:codigoGlosa>2010</ans:codigoGlosa>
                        <ans:descricaoGlosa>Codigo invalido</ans:descricaoGlosa>
                    </ans:motivoGlosa>
                </ans:item>
            </ans:guia>
            <ans:glosa>
                <ans:codigoGlosa>1702</ans:codigoGlosa>
            </ans:glosa>
        </ans:retorno>"#;
        let parsed = tree::parse(doc).unwrap();
        let glosas = read_glosas(&parsed.root).unwrap();

        assert_eq!(glosas.len(), 2);
        assert_eq!(glosas[0].code, "2010");
        assert_eq!(glosas[0].description, "Codigo invalido");
        assert_eq!(glosas[0].rejected_value, Decimal::new(4000, 2));
        assert_eq!(glosas[0].item_sequence, Some(2));
        assert_eq!(glosas[0].procedure_code.as_deref(), Some("40301630"));
        assert_eq!(glosas[0].guide_number.as_deref(), Some("G1"));
        assert_eq!(glosas[1].code, "1702");
        assert_eq!(glosas[1].rejected_value, Decimal::ZERO);
        assert_eq!(glosas[1].guide_number, None);
    }

    #[test]
    fn test_item_value_is_attributed_once() {
        let doc = r#"<retorno>
            <item>
                <sequencialItem>1</sequencialItem>
                <valorGlosa>60,00</valorGlosa>
                <relacaoGlosa><codigoGlosa>2010</codigoGlosa></relacaoGlosa>
                <relacaoGlosa><codigoGlosa>1702</codigoGlosa></relacaoGlosa>
            </item>
            <item>
                <sequencialItem>2</sequencialItem>
                <valorGlosa>99,00</valorGlosa>
                <relacaoGlosa><codigoGlosa>1801</codigoGlosa><valorGlosa>10,00</valorGlosa></relacaoGlosa>
                <relacaoGlosa><codigoGlosa>1802</codigoGlosa></relacaoGlosa>
            </item>
        </retorno>"#;
        let parsed = tree::parse(doc).unwrap();
        let glosas = read_glosas(&parsed.root).unwrap();

        let values: Vec<Decimal> = glosas.iter().map(|g| g.rejected_value).collect();
        assert_eq!(
            values,
            vec![
                Decimal::new(6000, 2),
                Decimal::ZERO,
                Decimal::new(1000, 2),
                Decimal::new(9900, 2),
            ]
        );
        assert!(glosas.iter().take(2).all(|g| g.item_sequence == Some(1)));
    }

    #[test]
    fn test_unparsable_glosa_value_is_an_error() {
        let doc = "<retorno><glosa><codigoGlosa>1702</codigoGlosa><valorGlosa>abc</valorGlosa></glosa></retorno>";
        let parsed = tree::parse(doc).unwrap();
        let err = read_glosas(&parsed.root).unwrap_err();
        assert!(matches!(err, BillingError::InvalidMoney(ref v) if v == "abc"));
    }
}
