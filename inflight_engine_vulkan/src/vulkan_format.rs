/// Conversions between engine value types and Vulkan enums/flags
///
/// All pure functions; the mapping tables are unit tested without a GPU.

use ash::vk;
use ash::vk::Handle;
use inflight_engine::inflight::device::{
    AccessFlags, ClearValue, Extent2D, Format, ImageLayout, LoadOp, PipelineStages, SampleCount, StoreOp,
};
use inflight_engine::inflight::render::{Attachment, Dependency, SubpassRef};
use inflight_engine::inflight::swapchain::{ColorSpace, CompositeAlpha, PresentMode, SurfaceTransform};
use inflight_engine::inflight::Error;
use inflight_engine::inflight_error;

// ============================================================================
// Formats and attachment operations
// ============================================================================

pub(crate) fn format_to_vk(format: Format) -> vk::Format {
    match format {
        Format::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        Format::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        Format::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        Format::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        Format::D16_UNORM => vk::Format::D16_UNORM,
        Format::D32_FLOAT => vk::Format::D32_SFLOAT,
        Format::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        Format::D32_FLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

/// `None` for formats the engine does not model
pub(crate) fn format_from_vk(format: vk::Format) -> Option<Format> {
    match format {
        vk::Format::R8G8B8A8_SRGB => Some(Format::R8G8B8A8_SRGB),
        vk::Format::R8G8B8A8_UNORM => Some(Format::R8G8B8A8_UNORM),
        vk::Format::B8G8R8A8_SRGB => Some(Format::B8G8R8A8_SRGB),
        vk::Format::B8G8R8A8_UNORM => Some(Format::B8G8R8A8_UNORM),
        vk::Format::D16_UNORM => Some(Format::D16_UNORM),
        vk::Format::D32_SFLOAT => Some(Format::D32_FLOAT),
        vk::Format::D24_UNORM_S8_UINT => Some(Format::D24_UNORM_S8_UINT),
        vk::Format::D32_SFLOAT_S8_UINT => Some(Format::D32_FLOAT_S8_UINT),
        _ => None,
    }
}

pub(crate) fn sample_count_to_vk(samples: SampleCount) -> vk::SampleCountFlags {
    match samples {
        SampleCount::S1 => vk::SampleCountFlags::TYPE_1,
        SampleCount::S2 => vk::SampleCountFlags::TYPE_2,
        SampleCount::S4 => vk::SampleCountFlags::TYPE_4,
        SampleCount::S8 => vk::SampleCountFlags::TYPE_8,
        SampleCount::S16 => vk::SampleCountFlags::TYPE_16,
        SampleCount::S32 => vk::SampleCountFlags::TYPE_32,
        SampleCount::S64 => vk::SampleCountFlags::TYPE_64,
    }
}

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::Preinitialized => vk::ImageLayout::PREINITIALIZED,
        ImageLayout::General => vk::ImageLayout::GENERAL,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        ImageLayout::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

// Engine stage/access bits use the native values
pub(crate) fn stages_to_vk(stages: PipelineStages) -> vk::PipelineStageFlags {
    vk::PipelineStageFlags::from_raw(stages.bits())
}

pub(crate) fn access_to_vk(access: AccessFlags) -> vk::AccessFlags {
    vk::AccessFlags::from_raw(access.bits())
}

pub(crate) fn subpass_ref_to_vk(subpass: SubpassRef) -> u32 {
    match subpass {
        SubpassRef::External => vk::SUBPASS_EXTERNAL,
        SubpassRef::Index(index) => index,
    }
}

pub(crate) fn clear_value_to_vk(value: Option<ClearValue>) -> vk::ClearValue {
    match value {
        Some(ClearValue::Color(color)) => vk::ClearValue {
            color: vk::ClearColorValue { float32: color },
        },
        Some(ClearValue::DepthStencil { depth, stencil }) => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        },
        // Ignored by the device for attachments that are not cleared
        None => vk::ClearValue::default(),
    }
}

pub(crate) fn extent_to_vk(extent: Extent2D) -> vk::Extent2D {
    vk::Extent2D { width: extent.width, height: extent.height }
}

// ============================================================================
// Render pass pieces
// ============================================================================

pub(crate) fn attachment_description(attachment: &Attachment) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(format_to_vk(attachment.format()))
        .samples(sample_count_to_vk(attachment.samples()))
        .load_op(load_op_to_vk(attachment.load_op()))
        .store_op(store_op_to_vk(attachment.store_op()))
        .stencil_load_op(load_op_to_vk(attachment.stencil_load_op()))
        .stencil_store_op(store_op_to_vk(attachment.stencil_store_op()))
        .initial_layout(image_layout_to_vk(attachment.initial_layout()))
        .final_layout(image_layout_to_vk(attachment.final_layout()))
}

pub(crate) fn subpass_dependency(dependency: &Dependency) -> vk::SubpassDependency {
    let flags = if dependency.by_region {
        vk::DependencyFlags::BY_REGION
    } else {
        vk::DependencyFlags::empty()
    };
    vk::SubpassDependency::default()
        .src_subpass(subpass_ref_to_vk(dependency.src))
        .dst_subpass(subpass_ref_to_vk(dependency.dst))
        .src_stage_mask(stages_to_vk(dependency.src_stages))
        .src_access_mask(access_to_vk(dependency.src_access))
        .dst_stage_mask(stages_to_vk(dependency.dst_stages))
        .dst_access_mask(access_to_vk(dependency.dst_access))
        .dependency_flags(flags)
}

// ============================================================================
// Surface enums
// ============================================================================

pub(crate) fn present_mode_to_vk(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
    }
}

pub(crate) fn present_mode_from_vk(mode: vk::PresentModeKHR) -> Option<PresentMode> {
    match mode {
        vk::PresentModeKHR::IMMEDIATE => Some(PresentMode::Immediate),
        vk::PresentModeKHR::MAILBOX => Some(PresentMode::Mailbox),
        vk::PresentModeKHR::FIFO => Some(PresentMode::Fifo),
        vk::PresentModeKHR::FIFO_RELAXED => Some(PresentMode::FifoRelaxed),
        _ => None,
    }
}

pub(crate) fn color_space_to_vk(color_space: ColorSpace) -> vk::ColorSpaceKHR {
    match color_space {
        ColorSpace::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }
}

pub(crate) fn color_space_from_vk(color_space: vk::ColorSpaceKHR) -> Option<ColorSpace> {
    match color_space {
        vk::ColorSpaceKHR::SRGB_NONLINEAR => Some(ColorSpace::SrgbNonlinear),
        _ => None,
    }
}

const COMPOSITE_ALPHAS: [(CompositeAlpha, vk::CompositeAlphaFlagsKHR); 4] = [
    (CompositeAlpha::Opaque, vk::CompositeAlphaFlagsKHR::OPAQUE),
    (CompositeAlpha::PreMultiplied, vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED),
    (CompositeAlpha::PostMultiplied, vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED),
    (CompositeAlpha::Inherit, vk::CompositeAlphaFlagsKHR::INHERIT),
];

const TRANSFORMS: [(SurfaceTransform, vk::SurfaceTransformFlagsKHR); 6] = [
    (SurfaceTransform::Identity, vk::SurfaceTransformFlagsKHR::IDENTITY),
    (SurfaceTransform::Rotate90, vk::SurfaceTransformFlagsKHR::ROTATE_90),
    (SurfaceTransform::Rotate180, vk::SurfaceTransformFlagsKHR::ROTATE_180),
    (SurfaceTransform::Rotate270, vk::SurfaceTransformFlagsKHR::ROTATE_270),
    (SurfaceTransform::HorizontalMirror, vk::SurfaceTransformFlagsKHR::HORIZONTAL_MIRROR),
    (SurfaceTransform::Inherit, vk::SurfaceTransformFlagsKHR::INHERIT),
];

pub(crate) fn composite_alpha_to_vk(alpha: CompositeAlpha) -> vk::CompositeAlphaFlagsKHR {
    COMPOSITE_ALPHAS
        .iter()
        .find(|(engine, _)| *engine == alpha)
        .map(|(_, native)| *native)
        .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE)
}

/// Every engine composite alpha mode set in `flags`
pub(crate) fn composite_alphas_from_vk(flags: vk::CompositeAlphaFlagsKHR) -> Vec<CompositeAlpha> {
    COMPOSITE_ALPHAS
        .iter()
        .filter(|(_, native)| flags.contains(*native))
        .map(|(engine, _)| *engine)
        .collect()
}

pub(crate) fn transform_to_vk(transform: SurfaceTransform) -> vk::SurfaceTransformFlagsKHR {
    TRANSFORMS
        .iter()
        .find(|(engine, _)| *engine == transform)
        .map(|(_, native)| *native)
        .unwrap_or(vk::SurfaceTransformFlagsKHR::IDENTITY)
}

/// Every engine transform set in `flags`
pub(crate) fn transforms_from_vk(flags: vk::SurfaceTransformFlagsKHR) -> Vec<SurfaceTransform> {
    TRANSFORMS
        .iter()
        .filter(|(_, native)| flags.contains(*native))
        .map(|(engine, _)| *engine)
        .collect()
}

/// The single transform in `flags`; mirrored rotations are reported as identity
pub(crate) fn transform_from_vk(flags: vk::SurfaceTransformFlagsKHR) -> SurfaceTransform {
    transforms_from_vk(flags).first().copied().unwrap_or(SurfaceTransform::Identity)
}

// ============================================================================
// Handles and errors
// ============================================================================

pub(crate) fn to_raw<H: Handle>(handle: H) -> u64 {
    handle.as_raw()
}

pub(crate) fn from_raw<H: Handle>(raw: u64) -> H {
    H::from_raw(raw)
}

/// Map a failed Vulkan call to an engine error and log it
///
/// Device loss and memory exhaustion keep their own variants; everything else
/// becomes a `BackendError` naming the operation.
pub(crate) fn vk_error(operation: &str, result: vk::Result) -> Error {
    let error = match result {
        vk::Result::ERROR_DEVICE_LOST => Error::DeviceLost,
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => Error::OutOfMemory,
        other => Error::BackendError(format!("Failed to {}: {:?}", operation, other)),
    };
    inflight_error!("inflight::vulkan", "Failed to {}: {:?}", operation, result);
    error
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
