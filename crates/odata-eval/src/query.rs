//! `$filter`, `$search` and `$orderby` over collections of instances
//!
//! Each operation takes ownership of the items and hands back the ones that
//! survive, in order. Items only need to borrow as a [`ComplexValue`], so
//! plain values and entities both work.

use chrono::{DateTime, FixedOffset, Utc};
use odata_ast::{Node, OrderByItem, SearchExpression, SortDirection};
use odata_model::ComplexValue;
use odata_types::Primitive;
use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::context::EvaluationContext;
use crate::engine::ExpressionEngine;
use crate::error::EvalResult;
use crate::operators::sort_compare;
use crate::search::SearchHandler;

impl ExpressionEngine {
    /// Keep the items whose predicate evaluates to true
    ///
    /// Null and false both exclude an item. The first evaluation error aborts
    /// the whole filter.
    pub fn filter<T: Borrow<ComplexValue>>(&self, items: Vec<T>, predicate: &Node) -> EvalResult<Vec<T>> {
        let now = DateTime::<FixedOffset>::from(Utc::now());
        let total = items.len();
        let mut kept = Vec::with_capacity(total);

        for item in items {
            let keep = {
                let value: &ComplexValue = item.borrow();
                let mut ctx = EvaluationContext::new(value).with_now(now);
                self.matches(predicate, &mut ctx)?
            };
            if keep {
                kept.push(item);
            }
        }

        log::debug!("$filter {} kept {} of {} instance(s)", predicate, kept.len(), total);
        Ok(kept)
    }

    /// Keep the items matching a search expression
    pub fn search<T: Borrow<ComplexValue>>(
        &self,
        items: Vec<T>,
        expr: &SearchExpression,
        handler: Option<&dyn SearchHandler>,
    ) -> Vec<T> {
        let total = items.len();
        let kept: Vec<T> = items
            .into_iter()
            .filter(|item| {
                let value: &ComplexValue = item.borrow();
                let mut ctx = EvaluationContext::new(value);
                if let Some(handler) = handler {
                    ctx = ctx.with_search_handler(handler);
                }
                self.evaluate_search(expr, &ctx)
            })
            .collect();

        log::debug!("$search {} kept {} of {} instance(s)", expr, kept.len(), total);
        kept
    }

    /// Stable sort by the `$orderby` items
    ///
    /// Nulls sort first ascending and last descending. Keys that do not
    /// compare with each other are a type mismatch, reported before anything
    /// is reordered.
    pub fn order_by<T: Borrow<ComplexValue>>(&self, items: Vec<T>, order: &[OrderByItem]) -> EvalResult<Vec<T>> {
        if order.is_empty() {
            return Ok(items);
        }

        let now = DateTime::<FixedOffset>::from(Utc::now());
        let mut keyed = Vec::with_capacity(items.len());
        for item in items {
            let keys = {
                let value: &ComplexValue = item.borrow();
                let mut ctx = EvaluationContext::new(value).with_now(now);
                order
                    .iter()
                    .map(|o| self.evaluate(&o.expr, &mut ctx)?.into_primitive("$orderby"))
                    .collect::<EvalResult<Vec<_>>>()?
            };
            keyed.push((keys, item));
        }

        for column in 0..order.len() {
            check_comparable(keyed.iter().filter_map(|(keys, _)| keys[column].as_ref()))?;
        }

        keyed.sort_by(|(a, _), (b, _)| {
            order
                .iter()
                .zip(a.iter().zip(b.iter()))
                .map(|(item, (x, y))| {
                    let ordering = compare_keys(x.as_ref(), y.as_ref());
                    match item.direction {
                        SortDirection::Ascending => ordering,
                        SortDirection::Descending => ordering.reverse(),
                    }
                })
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });

        log::debug!("$orderby sorted {} instance(s) by {} key(s)", keyed.len(), order.len());
        Ok(keyed.into_iter().map(|(_, item)| item).collect())
    }
}

/// Every key must compare with the first one
fn check_comparable<'a>(mut keys: impl Iterator<Item = &'a Primitive>) -> EvalResult<()> {
    let Some(first) = keys.next() else {
        return Ok(());
    };
    keys.try_for_each(|key| sort_compare(first, key).map(|_| ()))
}

fn compare_keys(x: Option<&Primitive>, y: Option<&Primitive>) -> Ordering {
    match (x, y) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => sort_compare(x, y).unwrap_or(Ordering::Equal),
    }
}
