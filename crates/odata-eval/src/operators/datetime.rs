//! Date and time functions
//!
//! Implements: year, month, day, hour, minute, second, now
//! Components of an `Edm.DateTimeOffset` are taken in its own offset.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use odata_types::Primitive;

use crate::error::EvalError;
use crate::registry::{FunctionDefinition, FunctionRegistry};
use crate::value::Operand;

fn date_component(name: &'static str, component: fn(NaiveDate) -> i32) -> FunctionDefinition {
    FunctionDefinition::fixed(name, 1, move |args, _| match args.first() {
        None | Some(Operand::Null) => Ok(None),
        Some(Operand::Primitive(Primitive::Date(d))) => Ok(Some(Primitive::Int32(component(*d)))),
        Some(Operand::Primitive(Primitive::DateTimeOffset(dt))) => {
            Ok(Some(Primitive::Int32(component(dt.date_naive()))))
        }
        Some(other) => Err(EvalError::type_mismatch(
            name,
            "Edm.Date or Edm.DateTimeOffset",
            other.type_name(),
        )),
    })
}

fn time_component(name: &'static str, component: fn(NaiveTime) -> u32) -> FunctionDefinition {
    FunctionDefinition::fixed(name, 1, move |args, _| {
        let time = match args.first() {
            None | Some(Operand::Null) => return Ok(None),
            Some(Operand::Primitive(Primitive::TimeOfDay(t))) => *t,
            Some(Operand::Primitive(Primitive::DateTimeOffset(dt))) => dt.time(),
            Some(other) => {
                return Err(EvalError::type_mismatch(
                    name,
                    "Edm.TimeOfDay or Edm.DateTimeOffset",
                    other.type_name(),
                ));
            }
        };
        // Components are at most 59
        Ok(Some(Primitive::Int32(component(time) as i32)))
    })
}

/// Register the date and time functions
pub fn register_datetime_functions(registry: &mut FunctionRegistry) {
    registry.register(date_component("year", |d| d.year()));
    registry.register(date_component("month", |d| d.month() as i32));
    registry.register(date_component("day", |d| d.day() as i32));
    registry.register(time_component("hour", |t| t.hour()));
    registry.register(time_component("minute", |t| t.minute()));
    registry.register(time_component("second", |t| t.second()));
    registry.register(FunctionDefinition::fixed("now", 0, |_, ctx| {
        Ok(Some(Primitive::DateTimeOffset(ctx.now())))
    }));
}
