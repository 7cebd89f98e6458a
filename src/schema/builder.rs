//! Schema versioning: discover, merge with persisted metadata, assign ids.
//!
//! A build walks every class in a [`TypeScope`], reflects it into a fresh
//! [`FlexClassInfo`], merges that against what the [`MetaStore`] remembers
//! from earlier versions and hands out ids for anything new. Ids are never
//! reused; members that disappeared stay behind as dead placeholders so
//! older streams can still be skipped.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use super::descriptor::{
    EncodingHint, MemberAttrs, MemberDescriptor, MemberType, TypeDescriptor, TypeScope, TypeShape,
};
use super::meta_file::encode_class_info;
use super::store::MetaStore;
use super::types::{
    BitWidth, FlexClassInfo, FlexDetail, FlexMemberInfo, MemberKind, ObjectDetail, ScalarDetail,
    ScalarKind,
};
use crate::codec::wire::{MAX_MEMBER_ID, MAX_TYPE_ID, MAX_TYPE_INDEX};
use crate::error::SchemaError;
use crate::registry::Schema;

/// Knobs for a schema build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Write absent objects and arrays as explicit nulls in every class.
    pub serialize_null: bool,
    /// Keep metadata of types that are no longer registered.
    pub keep_stale_types: bool,
    /// Write merged metadata back to the store.
    pub persist: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            serialize_null: false,
            keep_stale_types: true,
            persist: true,
        }
    }
}

impl BuildOptions {
    /// Check compatibility against the store without touching it.
    pub fn dry_run() -> Self {
        BuildOptions {
            persist: false,
            ..Self::default()
        }
    }

    pub fn with_serialize_null(mut self, serialize_null: bool) -> Self {
        self.serialize_null = serialize_null;
        self
    }

    pub fn with_keep_stale_types(mut self, keep: bool) -> Self {
        self.keep_stale_types = keep;
        self
    }
}

/// Result of a build: the usable schema plus every type that failed.
#[derive(Debug)]
pub struct BuildReport {
    pub schema: Schema,
    pub failures: Vec<SchemaError>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds a [`Schema`] from a scope and a metadata store.
#[derive(Debug)]
pub struct SchemaBuilder<'a> {
    scope: &'a TypeScope,
    options: BuildOptions,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(scope: &'a TypeScope) -> Self {
        SchemaBuilder {
            scope,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Build, failing on the first type that could not be built.
    pub fn build_strict(&self, store: &mut dyn MetaStore) -> Result<Schema, SchemaError> {
        let report = self.build(store)?;
        match report.failures.into_iter().next() {
            Some(failure) => Err(failure),
            None => Ok(report.schema),
        }
    }

    /// Build every class in scope.
    ///
    /// Failing types are reported, left untouched in the store and excluded
    /// from the schema along with every type that references them. Only
    /// store and metadata encoding errors abort the build. Stale entries
    /// are discarded after every built type has been written.
    pub fn build(&self, store: &mut dyn MetaStore) -> Result<BuildReport, SchemaError> {
        let persisted: HashMap<String, FlexClassInfo> = store
            .load_all()?
            .into_iter()
            .map(|info| (info.type_name.clone(), info))
            .collect();

        let mut built = Vec::new();
        let mut failures: Vec<(String, SchemaError)> = Vec::new();

        for descriptor in self.scope.iter().filter(|d| d.is_class()) {
            match self.build_class(descriptor, persisted.get(&descriptor.name)) {
                Ok(info) => built.push(info),
                Err(e) => failures.push((descriptor.name.clone(), e)),
            }
        }

        assign_type_ids(&mut built, &persisted, &mut failures);
        propagate_failures(&mut built, &mut failures);

        let failed: HashSet<&str> = failures.iter().map(|(name, _)| name.as_str()).collect();
        let mut retained = Vec::new();
        let mut discarded = Vec::new();
        for (name, old) in &persisted {
            if failed.contains(name.as_str()) {
                retained.push(old.clone());
            } else if !self.scope.contains(name) {
                if self.options.keep_stale_types {
                    warn!(type_name = %name, "type is no longer registered, keeping its metadata");
                    retained.push(old.clone());
                } else {
                    discarded.push(name.as_str());
                }
            }
        }

        if self.options.persist {
            // Encode everything before the first write so an encoding
            // error leaves the store untouched.
            let encoded = built
                .iter()
                .map(|info| Ok((info.type_name.as_str(), encode_class_info(info)?)))
                .collect::<Result<Vec<_>, SchemaError>>()?;
            for (name, bytes) in encoded {
                store.store_encoded(name, bytes)?;
            }
            for name in discarded {
                info!(type_name = %name, "discarding metadata of unregistered type");
                store.discard(name)?;
            }
        }

        for (name, e) in &failures {
            warn!(type_name = %name, error = %e, "type failed to build");
        }
        info!(
            types = built.len(),
            retained = retained.len(),
            failures = failures.len(),
            "schema built"
        );

        let unions = self
            .scope
            .unions()
            .map(|(name, types)| (name.to_string(), types))
            .collect();
        built.extend(retained);
        Ok(BuildReport {
            schema: Schema::new(built, unions),
            failures: failures.into_iter().map(|(_, e)| e).collect(),
        })
    }

    fn build_class(
        &self,
        descriptor: &TypeDescriptor,
        old: Option<&FlexClassInfo>,
    ) -> Result<FlexClassInfo, SchemaError> {
        let mut info = discover(self.scope, descriptor, &self.options)?;
        if let Some(old) = old {
            merge(&mut info, old)?;
        }
        assign_member_ids(&mut info)?;
        debug!(
            type_name = %info.type_name,
            members = info.members.len(),
            live = info.live_members().count(),
            "class merged"
        );
        Ok(info)
    }
}

/// Reflect a class descriptor into metadata with unassigned ids.
pub fn discover(
    scope: &TypeScope,
    descriptor: &TypeDescriptor,
    options: &BuildOptions,
) -> Result<FlexClassInfo, SchemaError> {
    let TypeShape::Class {
        members,
        serialize_null,
    } = &descriptor.shape
    else {
        return Err(SchemaError::UnsupportedShape {
            type_name: descriptor.name.clone(),
            member: String::new(),
            reason: "unions have no members of their own".into(),
        });
    };

    let mut info = FlexClassInfo::new(&descriptor.name);
    info.serialize_null = *serialize_null || options.serialize_null;
    for member in members {
        let unsupported = |reason: String| SchemaError::UnsupportedShape {
            type_name: descriptor.name.clone(),
            member: member.name.clone(),
            reason,
        };
        if info.member_by_name(&member.name).is_some() {
            return Err(unsupported("member name declared twice".into()));
        }
        let kind = member_kind(scope, member).map_err(unsupported)?;
        info.members.push(FlexMemberInfo::new(&member.name, kind));
    }
    Ok(info)
}

fn member_kind(scope: &TypeScope, member: &MemberDescriptor) -> Result<MemberKind, String> {
    // An absent member is simply not written, so the outer level may be nullable.
    match member.ty.non_null() {
        MemberType::Array { element, is_list } => Ok(MemberKind::Array {
            element: element_detail(scope, element, &member.attrs)?,
            is_list: *is_list,
        }),
        MemberType::Dictionary { key, value } => {
            if key.is_optional() {
                return Err("dictionary keys cannot be null".into());
            }
            Ok(MemberKind::Dictionary {
                key: element_detail(scope, key, &MemberAttrs::default())?,
                value: element_detail(scope, value, &member.attrs)?,
            })
        }
        ty => Ok(MemberKind::Simple(element_detail(scope, ty, &member.attrs)?)),
    }
}

fn element_detail(
    scope: &TypeScope,
    ty: &MemberType,
    attrs: &MemberAttrs,
) -> Result<FlexDetail, String> {
    match ty {
        MemberType::Scalar(kind, width) => {
            scalar_detail(*kind, *width, attrs).map(FlexDetail::Scalar)
        }
        MemberType::Object(name) => {
            if *attrs != MemberAttrs::default() {
                return Err("encoding attributes only apply to scalars".into());
            }
            if !scope.contains(name) {
                return Err(format!("type '{}' is not registered", name));
            }
            let types = scope.assignable_types(name);
            if types.is_empty() {
                return Err(format!("no concrete type is assignable to '{}'", name));
            }
            if types.len() > MAX_TYPE_INDEX as usize {
                return Err(format!("{} types are assignable to '{}'", types.len(), name));
            }
            Ok(FlexDetail::Object(ObjectDetail::new(types)))
        }
        // Object elements carry a null type index; scalars have no null form.
        MemberType::Optional(inner) => match inner.as_ref() {
            MemberType::Scalar(kind, _) => {
                Err(format!("nullable {} elements are not supported", kind.name()))
            }
            inner => element_detail(scope, inner, attrs),
        },
        MemberType::Array { .. } | MemberType::Dictionary { .. } => {
            Err("nested collections are not supported".into())
        }
    }
}

fn bits_needed(value: u64) -> u8 {
    (64 - value.leading_zeros()) as u8
}

fn scalar_detail(
    kind: ScalarKind,
    width: BitWidth,
    attrs: &MemberAttrs,
) -> Result<ScalarDetail, String> {
    if attrs.bits.is_some() && attrs.range.is_some() {
        return Err("bits and range cannot be combined".into());
    }

    if let Some(hint) = attrs.encoding {
        if attrs.bits.is_some() || attrs.range.is_some() {
            return Err(format!("{:?} encoding cannot be combined with an explicit width", hint));
        }
        let fits_32 = matches!(width, BitWidth::Fixed(bits) if bits <= 32);
        let encoded = match (hint, kind) {
            (EncodingHint::VarInt, ScalarKind::Int) if fits_32 => ScalarKind::VarInt,
            (EncodingHint::VarInt, ScalarKind::Int) => ScalarKind::VarLong,
            (EncodingHint::Lossy, ScalarKind::Float) => ScalarKind::LossyFloat,
            (EncodingHint::EnumInt, ScalarKind::UInt | ScalarKind::Byte) if fits_32 => {
                ScalarKind::EnumInt
            }
            _ => return Err(format!("{:?} encoding does not apply to {}", hint, kind.name())),
        };
        return Ok(ScalarDetail::new(encoded, BitWidth::Variable));
    }

    // Bytes with a width attribute become plain unsigned integers.
    let explicit_kind = match kind {
        ScalarKind::Int => ScalarKind::Int,
        ScalarKind::UInt | ScalarKind::Byte => ScalarKind::UInt,
        _ if attrs.bits.is_some() => {
            return Err(format!("an explicit width does not apply to {}", kind.name()))
        }
        _ if attrs.range.is_some() => {
            return Err(format!("a range does not apply to {}", kind.name()))
        }
        _ => return Ok(ScalarDetail::new(kind, width)),
    };
    let type_bits = match width {
        BitWidth::Fixed(bits) => bits,
        BitWidth::Variable => 64,
    };

    let bits = if let Some(bits) = attrs.bits {
        if bits == 0 || bits > 64 {
            return Err(format!("width {} is outside 1..=64", bits));
        }
        bits
    } else if let Some((min, max)) = attrs.range {
        if min > max {
            return Err(format!("empty range {}..={}", min, max));
        }
        match explicit_kind {
            ScalarKind::Int => {
                let negative = if min < 0 { !min as u64 } else { 0 };
                let positive = if max > 0 { max as u64 } else { 0 };
                1 + bits_needed(negative.max(positive))
            }
            _ if min < 0 => return Err("unsigned members cannot have a negative range".into()),
            _ => bits_needed(max as u64).max(1),
        }
    } else {
        return Ok(ScalarDetail::new(kind, width));
    };

    if bits > type_bits {
        return Err(format!("{} bits do not fit a {}-bit {}", bits, type_bits, kind.name()));
    }
    Ok(ScalarDetail::explicit(explicit_kind, bits))
}

/// Carry ids and polymorphic type order over from the persisted version.
///
/// Old members missing from `info` are kept as dead placeholders; a
/// same-named member whose wire detail changed is a breaking change.
pub fn merge(info: &mut FlexClassInfo, old: &FlexClassInfo) -> Result<(), SchemaError> {
    for old_member in &old.members {
        match info.members.iter_mut().find(|m| m.name == old_member.name) {
            Some(member) => {
                member.kind = member.kind.merged_with(&old_member.kind).ok_or_else(|| {
                    SchemaError::BreakingChange {
                        type_name: info.type_name.clone(),
                        member: member.name.clone(),
                        old: old_member.kind.to_string(),
                        new: member.kind.to_string(),
                    }
                })?;
                member.id = old_member.id;
            }
            None => info.members.push(FlexMemberInfo {
                live: false,
                ..old_member.clone()
            }),
        }
    }
    if info.type_id.is_none() {
        info.type_id = old.type_id;
    }
    Ok(())
}

/// Give every unassigned member the next free id and sort by id.
pub fn assign_member_ids(info: &mut FlexClassInfo) -> Result<(), SchemaError> {
    let too_many = |info: &FlexClassInfo| SchemaError::TooManyMembers {
        type_name: info.type_name.clone(),
        count: info.members.len(),
    };

    let mut next = info.members.iter().map(|m| m.id as u32).max().unwrap_or(0) + 1;
    if next - 1 > MAX_MEMBER_ID as u32 {
        return Err(too_many(info));
    }
    for i in 0..info.members.len() {
        if info.members[i].id != 0 {
            continue;
        }
        if next > MAX_MEMBER_ID as u32 {
            return Err(too_many(info));
        }
        info.members[i].id = next as u16;
        debug!(
            type_name = %info.type_name,
            member = %info.members[i].name,
            id = next,
            "assigned member id"
        );
        next += 1;
    }
    info.members.sort_by_key(|m| m.id);
    Ok(())
}

fn assign_type_ids(
    built: &mut Vec<FlexClassInfo>,
    persisted: &HashMap<String, FlexClassInfo>,
    failures: &mut Vec<(String, SchemaError)>,
) {
    let mut next = persisted
        .values()
        .chain(built.iter())
        .filter_map(|info| info.type_id)
        .map(|id| id as u32 + 1)
        .max()
        .unwrap_or(0);

    for info in built.iter_mut().filter(|info| info.type_id.is_none()) {
        if next > MAX_TYPE_ID as u32 {
            continue;
        }
        info.type_id = Some(next as u16);
        debug!(type_name = %info.type_name, type_id = next, "assigned type id");
        next += 1;
    }

    built.retain(|info| {
        if info.type_id.is_some() {
            return true;
        }
        failures.push((
            info.type_name.clone(),
            SchemaError::TooManyTypes(info.type_name.clone()),
        ));
        false
    });
}

/// Drop every class that references a failed class, transitively.
fn propagate_failures(built: &mut Vec<FlexClassInfo>, failures: &mut Vec<(String, SchemaError)>) {
    loop {
        let failed: HashSet<String> = failures.iter().map(|(name, _)| name.clone()).collect();
        let mut newly_failed = Vec::new();
        built.retain(|info| {
            let broken = info.dependencies().into_iter().find(|dep| failed.contains(*dep));
            match broken {
                Some(dependency) => {
                    newly_failed.push((
                        info.type_name.clone(),
                        SchemaError::DependencyFailed {
                            type_name: info.type_name.clone(),
                            dependency: dependency.to_string(),
                        },
                    ));
                    false
                }
                None => true,
            }
        });
        if newly_failed.is_empty() {
            return;
        }
        failures.extend(newly_failed);
    }
}
