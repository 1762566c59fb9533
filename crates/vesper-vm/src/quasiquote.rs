use vesper_core::{Value, VesperError};

use crate::ops::keywords;

/// Expand a quasiquote template into a value-building expression ready for
/// evaluation.
///
/// Unquoted holes become the expressions themselves; spliced holes merge
/// into the expanded tail with `append`; everything constant collapses back
/// into plain quotes. Nested quasiquotes track depth, and unquotes only
/// fire at depth zero.
pub fn expand_qq(template: &Value, depth: usize) -> Result<Value, VesperError> {
    let kw = keywords();

    if let Value::Vector(vec) = template {
        // expand the element list, then rebuild vector shape around it
        let elements = Value::list(vec.items.borrow().clone());
        let expanded = expand_qq(&elements, depth)?;
        return Ok(Value::list(vec![
            Value::Symbol(kw.list_to_vector),
            expanded,
        ]));
    }

    let Value::Pair(pair) = template else {
        return Ok(quote(template));
    };

    let car = pair.car.borrow().clone();
    let cdr = pair.cdr.borrow().clone();

    // another quasiquote level: keep it quoted and deepen
    if matches!(&car, Value::Symbol(s) if *s == kw.quasiquote) {
        return fixup_cons(template, quote(&car), expand_qq(&cdr, depth + 1)?);
    }

    if depth == 0 {
        if matches!(&car, Value::Symbol(s) if *s == kw.unquote) {
            // (unquote x) is replaced by the expression x itself
            return cdr.car();
        }

        if matches!(&car, Value::Symbol(s) if *s == kw.unquote_splicing) {
            return Err(VesperError::eval("can't splice into a non-list"));
        }

        // a list element of the form (unquote-splicing e) merges with the
        // expanded tail
        if let Value::Pair(inner) = &car {
            let inner_car = inner.car.borrow().clone();
            if matches!(&inner_car, Value::Symbol(s) if *s == kw.unquote_splicing) {
                let spliced = inner.cdr.borrow().car()?;
                return merge_qq(template, spliced, expand_qq(&cdr, depth)?);
            }
        }

        fixup_cons(template, expand_qq(&car, depth)?, expand_qq(&cdr, depth)?)
    } else {
        if matches!(&car, Value::Symbol(s) if *s == kw.unquote || *s == kw.unquote_splicing) {
            return fixup_cons(template, quote(&car), expand_qq(&cdr, depth - 1)?);
        }

        fixup_cons(template, expand_qq(&car, depth)?, expand_qq(&cdr, depth)?)
    }
}

/// Self-evaluating values stay bare; everything else gets wrapped in quote.
fn quote(value: &Value) -> Value {
    match value {
        Value::Bool(_) | Value::Char(_) | Value::Str(_) | Value::Number(_) => value.clone(),
        v if v.is_procedure() => v.clone(),
        v => Value::list(vec![Value::Symbol(keywords().quote), v.clone()]),
    }
}

fn is_quoted_pair(value: &Value) -> bool {
    match value {
        Value::Pair(p) => {
            matches!(&*p.car.borrow(), Value::Symbol(s) if *s == keywords().quote)
        }
        _ => false,
    }
}

/// Build `(cons left right)`, collapsing back to a single quote when both
/// sides are quotes of exactly the template's own halves.
fn fixup_cons(template: &Value, left: Value, right: Value) -> Result<Value, VesperError> {
    if is_quoted_pair(&left) && is_quoted_pair(&right) {
        if let Value::Pair(tp) = template {
            let quoted_left = left.cdr()?.car()?;
            let quoted_right = right.cdr()?.car()?;
            if quoted_left.is_equal(&tp.car.borrow()) && quoted_right.is_equal(&tp.cdr.borrow()) {
                return Ok(quote(template));
            }
        }
    }
    Ok(Value::list(vec![
        Value::Symbol(keywords().cons),
        left,
        right,
    ]))
}

/// Merge a spliced expression with the expanded remainder of the template,
/// skipping the append when the splice ends the list.
fn merge_qq(template: &Value, left: Value, right: Value) -> Result<Value, VesperError> {
    let template_is_end = matches!(template, Value::Pair(p) if p.cdr.borrow().is_null());
    let right_is_end = is_quoted_pair(&right) && right.cdr()?.car()?.is_null();

    if template_is_end || right_is_end {
        return Ok(left);
    }

    Ok(Value::list(vec![
        Value::Symbol(keywords().append),
        left,
        right,
    ]))
}
