use std::borrow::Cow;
use std::cell::Cell;

use caliper_value::{Comparator, Kind, Value, ValueError};

use crate::error::{ResultExt, ValidateError};
use crate::schema::{Additional, Items, Schema, SchemaId, SchemaNode, TypeSet};

/// Composition keywords may link a schema back into itself; past this many
/// nested schema applications to one walk the validation fails instead of
/// recursing further.
const MAX_VALIDATE_DEPTH: usize = 1000;

impl Schema {
    /// Validates an instance exposed through the [`Value`] capability,
    /// using `comparator` for `enum` and `uniqueItems` equality.
    pub fn validate<V, C>(&self, value: &V, comparator: &C) -> Result<(), ValidateError>
    where
        V: Value,
        C: Comparator<V>,
    {
        Validator {
            schema: self,
            comparator,
            depth: Cell::new(0),
        }
        .validate(self.root, value)
    }
}

struct Validator<'s, C> {
    schema: &'s Schema,
    comparator: &'s C,
    depth: Cell<usize>,
}

impl<C> Validator<'_, C> {
    fn validate<V>(&self, id: SchemaId, value: &V) -> Result<(), ValidateError>
    where
        V: Value,
        C: Comparator<V>,
    {
        if self.depth.get() >= MAX_VALIDATE_DEPTH {
            return Err(ValidateError::DepthExceeded);
        }
        self.depth.set(self.depth.get() + 1);
        let result = self.validate_node(id, value);
        self.depth.set(self.depth.get() - 1);
        result
    }

    fn validate_node<V>(&self, id: SchemaId, value: &V) -> Result<(), ValidateError>
    where
        V: Value,
        C: Comparator<V>,
    {
        let node = self.schema.node(id);
        let kind = value.kind();
        if kind == Kind::Invalid {
            return Err(ValueError::Invalid("unclassifiable value".to_owned()).into());
        }

        if !node.enum_values.is_empty()
            || !node.all_of.is_empty()
            || !node.one_of.is_empty()
            || !node.any_of.is_empty()
            || node.not.is_some()
        {
            if !node.enum_values.is_empty()
                && !self.comparator.contains(&node.enum_values, value)?
            {
                return Err(ValidateError::EnumMismatch).context("enum");
            }
            for (index, &child) in node.all_of.iter().enumerate() {
                self.validate(child, value)
                    .with_context(|| format!("[{index}]"))
                    .context("allOf")?;
            }
            if !node.one_of.is_empty() {
                let mut matched = false;
                for &child in &node.one_of {
                    if self.validate(child, value).is_ok() {
                        if matched {
                            return Err(ValidateError::ExactlyOnce).context("oneOf");
                        }
                        matched = true;
                    }
                }
                if !matched {
                    return Err(ValidateError::MustMatch).context("oneOf");
                }
            }
            if !node.any_of.is_empty()
                && !node
                    .any_of
                    .iter()
                    .any(|&child| self.validate(child, value).is_ok())
            {
                return Err(ValidateError::MustMatch).context("anyOf");
            }
            if let Some(not) = node.not {
                if self.validate(not, value).is_ok() {
                    return Err(ValidateError::MustNotMatch).context("not");
                }
            }
        }

        let checked = match kind {
            Kind::String => self.validate_string(node, value),
            Kind::Number => self.validate_number(node, value),
            Kind::Null => check_type(node, TypeSet::NULL),
            Kind::Bool => check_type(node, TypeSet::BOOL),
            Kind::Array => self.validate_array(node, value),
            Kind::Object => self.validate_object(node, value),
            Kind::Invalid => unreachable!("handled above"),
        };
        checked.context(kind.name())
    }

    fn validate_string<V>(&self, node: &SchemaNode, value: &V) -> Result<(), ValidateError>
    where
        V: Value,
        C: Comparator<V>,
    {
        check_type(node, TypeSet::STRING)?;
        if node.format.is_none()
            && node.min_length.is_none()
            && node.max_length.is_none()
            && node.pattern.is_none()
        {
            return Ok(());
        }

        let text = read_str(value)?;
        if node.min_length.is_some() || node.max_length.is_some() {
            // Lengths count Unicode scalar values, not bytes.
            let count = text.chars().count() as u64;
            if let Some(min) = node.min_length {
                if count < min {
                    return Err(ValidateError::MinLength(min));
                }
            }
            if let Some(max) = node.max_length {
                if count > max {
                    return Err(ValidateError::MaxLength(max));
                }
            }
        }
        if let Some(pattern) = &node.pattern {
            // Partial match; patterns anchor themselves if they mean to.
            if !pattern.is_match(&text) {
                return Err(ValidateError::PatternMismatch(pattern.as_str().to_owned()));
            }
        }
        Ok(())
    }

    fn validate_number<V>(&self, node: &SchemaNode, value: &V) -> Result<(), ValidateError>
    where
        V: Value,
        C: Comparator<V>,
    {
        // Coarse admission first: any numeric type in the set lets the
        // bounds run; strict integer-ness is judged after them.
        if !(node.types.admits(TypeSet::NUMBER) || node.types.contains(TypeSet::INTEGER)) {
            return Err(ValidateError::TypeNotAllowed);
        }
        let strict_integer =
            node.types.contains(TypeSet::INTEGER) && !node.types.contains(TypeSet::NUMBER);
        let has_bounds =
            node.minimum.is_some() || node.maximum.is_some() || node.multiple_of.is_some();
        if !has_bounds && !strict_integer {
            return Ok(());
        }

        let number = value
            .as_number()
            .ok_or_else(|| ValueError::Invalid("unreadable number".to_owned()))?;
        if let Some(min) = &node.minimum {
            let below = if node.exclusive_minimum {
                number <= *min
            } else {
                number < *min
            };
            if below {
                return Err(ValidateError::Minimum {
                    value: number,
                    bound: min.clone(),
                });
            }
        }
        if let Some(max) = &node.maximum {
            let above = if node.exclusive_maximum {
                number >= *max
            } else {
                number > *max
            };
            if above {
                return Err(ValidateError::Maximum {
                    value: number,
                    bound: max.clone(),
                });
            }
        }
        if let Some(step) = &node.multiple_of {
            if !number.is_multiple_of(step) {
                return Err(ValidateError::MultipleOf {
                    value: number,
                    bound: step.clone(),
                });
            }
        }
        if strict_integer && !number.is_integer() {
            return Err(ValidateError::TypeNotAllowed);
        }
        Ok(())
    }

    /// Chooses the schema for the element at `index`.
    ///
    /// When `items` is absent or a single schema, `additionalItems` never
    /// applies: absent items admits everything, a single schema covers
    /// every index.
    fn element_schema(
        &self,
        node: &SchemaNode,
        index: usize,
    ) -> Result<Option<SchemaId>, ValidateError> {
        match &node.items {
            None => return Ok(None),
            Some(Items::Single(schema)) => return Ok(Some(*schema)),
            Some(Items::Many(schemas)) => {
                if let Some(&schema) = schemas.get(index) {
                    return Ok(Some(schema));
                }
            }
        }
        match node.additional_items {
            None | Some(Additional::Bool(true)) => Ok(None),
            Some(Additional::Schema(schema)) => Ok(Some(schema)),
            Some(Additional::Bool(false)) => Err(ValidateError::AdditionalItems),
        }
    }

    fn validate_array<V>(&self, node: &SchemaNode, value: &V) -> Result<(), ValidateError>
    where
        V: Value,
        C: Comparator<V>,
    {
        check_type(node, TypeSet::ARRAY)?;
        if node.min_items.is_none()
            && node.max_items.is_none()
            && !node.unique_items
            && node.items.is_none()
            && node.additional_items.is_none()
        {
            return Ok(());
        }

        let mut count: u64 = 0;
        let mut seen: Vec<V> = Vec::new();
        value.each_element::<ValidateError, _>(|element| {
            let index = count as usize;
            if let Some(schema) = self.element_schema(node, index)? {
                self.validate(schema, &element)
                    .with_context(|| format!("[{index}]"))?;
            }
            if node.unique_items {
                seen.push(element);
            }
            count += 1;
            Ok(())
        })?;

        if seen.len() > 1 {
            for left in 0..seen.len() {
                for right in left + 1..seen.len() {
                    if self.comparator.equal(&seen[left], &seen[right])? {
                        return Err(ValidateError::NotUnique(left, right));
                    }
                }
            }
        }

        if let Some(min) = node.min_items {
            if count < min {
                return Err(ValidateError::MinLength(min));
            }
        }
        if let Some(max) = node.max_items {
            if count > max {
                return Err(ValidateError::MaxLength(max));
            }
        }
        Ok(())
    }

    fn validate_object<V>(&self, node: &SchemaNode, value: &V) -> Result<(), ValidateError>
    where
        V: Value,
        C: Comparator<V>,
    {
        check_type(node, TypeSet::OBJECT)?;
        if node.min_properties.is_none()
            && node.max_properties.is_none()
            && node.required.is_empty()
            && node.properties.is_empty()
            && node.pattern_properties.is_empty()
            && node.additional_properties.is_none()
            && node.dependent_required.is_empty()
            && node.dependent_schemas.is_empty()
        {
            return Ok(());
        }

        let mut missing = node.required.clone();

        if !node.dependent_required.is_empty() || !node.dependent_schemas.is_empty() {
            let mut dependent: Vec<(String, SchemaId)> = Vec::new();
            value
                .each_entry::<ValidateError, _>(|key, _| {
                    if let Some(extra) = node.dependent_required.get(key) {
                        for name in extra {
                            if !missing.contains(name.as_str()) {
                                missing.insert(name.clone());
                            }
                        }
                    }
                    if let Some(&schema) = node.dependent_schemas.get(key) {
                        dependent.push((key.to_owned(), schema));
                    }
                    Ok(())
                })
                .context("collect dependent")?;
            for (name, schema) in dependent {
                // The whole object revalidates under the dependent schema.
                self.validate(schema, value)
                    .with_context(|| format!("dependent {name:?}"))?;
            }
        }

        let multi =
            node.additional_properties.is_some() || !node.pattern_properties.is_empty();
        let mut count: u64 = 0;
        value.each_entry::<ValidateError, _>(|key, child| {
            missing.shift_remove(key);
            let property = node.properties.get(key).copied();
            if property.is_some() || multi {
                self.validate_entry(node, property, key, &child)
                    .with_context(|| format!("{key:?}"))?;
            }
            count += 1;
            Ok(())
        })?;

        if let Some(name) = missing.first() {
            return Err(ValidateError::MissingRequired(name.clone()));
        }
        if let Some(min) = node.min_properties {
            if count < min {
                return Err(ValidateError::MinLength(min));
            }
        }
        if let Some(max) = node.max_properties {
            if count > max {
                return Err(ValidateError::MaxLength(max));
            }
        }
        Ok(())
    }

    /// One key-value pair: every matching `patternProperties` entry in
    /// source order, then the named property; `additionalProperties` only
    /// governs pairs neither of those covered.
    fn validate_entry<V>(
        &self,
        node: &SchemaNode,
        property: Option<SchemaId>,
        key: &str,
        child: &V,
    ) -> Result<(), ValidateError>
    where
        V: Value,
        C: Comparator<V>,
    {
        let mut matched = false;
        for pattern in &node.pattern_properties {
            if pattern.regex.is_match(key) {
                matched = true;
                self.validate(pattern.schema, child)
                    .with_context(|| format!("pattern {:?}", pattern.regex.as_str()))?;
            }
        }
        if let Some(property) = property {
            return self.validate(property, child);
        }
        if matched {
            return Ok(());
        }
        match node.additional_properties {
            Some(Additional::Bool(false)) => Err(ValidateError::AdditionalProperties),
            Some(Additional::Schema(schema)) => self
                .validate(schema, child)
                .context("additionalProperties"),
            _ => Ok(()),
        }
    }
}

fn check_type(node: &SchemaNode, t: TypeSet) -> Result<(), ValidateError> {
    if node.types.admits(t) {
        Ok(())
    } else {
        Err(ValidateError::TypeNotAllowed)
    }
}

fn read_str<V: Value>(value: &V) -> Result<Cow<'_, str>, ValidateError> {
    value
        .as_str()
        .ok_or_else(|| ValueError::Invalid("unreadable string".to_owned()).into())
}
