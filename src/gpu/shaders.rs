//! WGSL generation for the group reduction kernels.
//!
//! One shader module is generated per `(kernel, element type, group size)`.
//! The group size is baked in as the workgroup size and the length of the
//! workgroup scratch array, so every workgroup reduces exactly one group.
//!
//! ## Binding layout
//!
//! * `@binding(0)` - read-only storage, pass input (`groups * G` elements)
//! * `@binding(1)` - read-write storage, one output per group
//! * `@binding(2)` - uniform [`KernelParams`](super::dispatch::KernelParams)
//!
//! ## Group indexing
//!
//! Dispatches are two-dimensional so that passes with more than
//! `max_compute_workgroups_per_dimension` groups still fit in one submission.
//! The linear group index is `workgroup_id.x + workgroup_id.y * num_workgroups.x`;
//! workgroups past `group_count` still take part in every barrier but write
//! nothing.

use crate::engine::kernel::GroupOp;
use crate::engine::types::Element;

/// Returns the `load` and `combine` WGSL bodies for `op`.
fn op_bodies<T: Element>(op: &GroupOp<T>) -> (&'static str, &'static str) {
    match op {
        GroupOp::Min => ("return x;", "return min(a, b);"),
        GroupOp::Max => ("return x;", "return max(a, b);"),
        GroupOp::Sum => ("return x;", "return a + b;"),
        GroupOp::SquaredDeviation { .. } => (
            "let d = x - params.mean;\n    return d * d;",
            "return a + b;",
        ),
    }
}

/// Generates the WGSL module for `op` over `wgsl_type` with groups of
/// `group_size` elements. The entry point is `op.kernel_name()`.
pub fn generate_kernel<T: Element>(op: &GroupOp<T>, wgsl_type: &str, group_size: usize) -> String {
    let (load, combine) = op_bodies(op);
    let entry = op.kernel_name();
    let zero = if wgsl_type == "f32" { "0.0" } else { "0" };

    format!(
        r#"// {entry} over {t}, {g} elements per group

struct KernelParams {{
    group_size: u32,
    group_count: u32,
    mean: {t},
    _pad: u32,
}}

@group(0) @binding(0) var<storage, read> input: array<{t}>;
@group(0) @binding(1) var<storage, read_write> output: array<{t}>;
@group(0) @binding(2) var<uniform> params: KernelParams;

var<workgroup> scratch: array<{t}, {g}>;

fn load(x: {t}) -> {t} {{
    {load}
}}

fn combine(a: {t}, b: {t}) -> {t} {{
    {combine}
}}

@compute @workgroup_size({g})
fn {entry}(@builtin(local_invocation_id) local_id: vec3<u32>,
           @builtin(workgroup_id) group_id: vec3<u32>,
           @builtin(num_workgroups) num_groups: vec3<u32>) {{
    let lid = local_id.x;
    let group = group_id.x + group_id.y * num_groups.x;
    let in_range = group < params.group_count;

    var value: {t} = {zero};
    if (in_range) {{
        value = load(input[group * {g}u + lid]);
    }}
    scratch[lid] = value;
    workgroupBarrier();

    for (var stride: u32 = 1u; stride < {g}u; stride = stride * 2u) {{
        if (lid % (2u * stride) == 0u && lid + stride < {g}u) {{
            scratch[lid] = combine(scratch[lid], scratch[lid + stride]);
        }}
        workgroupBarrier();
    }}

    if (in_range && lid == 0u) {{
        output[group] = scratch[0];
    }}
}}
"#,
        entry = entry,
        t = wgsl_type,
        g = group_size,
        zero = zero,
        load = load,
        combine = combine,
    )
}
