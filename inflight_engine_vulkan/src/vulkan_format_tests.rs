//! Unit tests for Vulkan conversion functions
//!
//! Pure mappings only; no GPU required.

use ash::vk;
use inflight_engine::inflight::device::{
    AccessFlags, ClearValue, Format, ImageLayout, LoadOp, PipelineStages, SampleCount, StoreOp,
};
use inflight_engine::inflight::render::{Attachment, Dependency, SubpassRef};
use inflight_engine::inflight::swapchain::{CompositeAlpha, PresentMode, SurfaceTransform};
use inflight_engine::inflight::Error;

use super::*;

const ALL_FORMATS: [Format; 8] = [
    Format::R8G8B8A8_SRGB,
    Format::R8G8B8A8_UNORM,
    Format::B8G8R8A8_SRGB,
    Format::B8G8R8A8_UNORM,
    Format::D16_UNORM,
    Format::D32_FLOAT,
    Format::D24_UNORM_S8_UINT,
    Format::D32_FLOAT_S8_UINT,
];

// ============================================================================
// FORMAT CONVERSION TESTS
// ============================================================================

#[test]
fn test_format_to_vk_color_formats() {
    assert_eq!(format_to_vk(Format::R8G8B8A8_SRGB), vk::Format::R8G8B8A8_SRGB);
    assert_eq!(format_to_vk(Format::R8G8B8A8_UNORM), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(format_to_vk(Format::B8G8R8A8_SRGB), vk::Format::B8G8R8A8_SRGB);
    assert_eq!(format_to_vk(Format::B8G8R8A8_UNORM), vk::Format::B8G8R8A8_UNORM);
}

#[test]
fn test_format_to_vk_depth_formats() {
    assert_eq!(format_to_vk(Format::D16_UNORM), vk::Format::D16_UNORM);
    assert_eq!(format_to_vk(Format::D32_FLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(format_to_vk(Format::D24_UNORM_S8_UINT), vk::Format::D24_UNORM_S8_UINT);
    assert_eq!(format_to_vk(Format::D32_FLOAT_S8_UINT), vk::Format::D32_SFLOAT_S8_UINT);
}

#[test]
fn test_format_from_vk_inverts_format_to_vk() {
    for format in ALL_FORMATS {
        assert_eq!(format_from_vk(format_to_vk(format)), Some(format));
    }
}

#[test]
fn test_format_from_vk_unknown() {
    assert_eq!(format_from_vk(vk::Format::R16G16B16A16_SFLOAT), None);
    assert_eq!(format_from_vk(vk::Format::A2B10G10R10_UNORM_PACK32), None);
}

// ============================================================================
// ATTACHMENT CONVERSION TESTS
// ============================================================================

#[test]
fn test_sample_counts() {
    assert_eq!(sample_count_to_vk(SampleCount::S1), vk::SampleCountFlags::TYPE_1);
    assert_eq!(sample_count_to_vk(SampleCount::S4), vk::SampleCountFlags::TYPE_4);
    assert_eq!(sample_count_to_vk(SampleCount::S64), vk::SampleCountFlags::TYPE_64);
}

#[test]
fn test_load_store_ops() {
    assert_eq!(load_op_to_vk(LoadOp::Load), vk::AttachmentLoadOp::LOAD);
    assert_eq!(load_op_to_vk(LoadOp::Clear), vk::AttachmentLoadOp::CLEAR);
    assert_eq!(load_op_to_vk(LoadOp::DontCare), vk::AttachmentLoadOp::DONT_CARE);
    assert_eq!(store_op_to_vk(StoreOp::Store), vk::AttachmentStoreOp::STORE);
    assert_eq!(store_op_to_vk(StoreOp::DontCare), vk::AttachmentStoreOp::DONT_CARE);
}

#[test]
fn test_image_layouts() {
    assert_eq!(image_layout_to_vk(ImageLayout::Undefined), vk::ImageLayout::UNDEFINED);
    assert_eq!(image_layout_to_vk(ImageLayout::ColorAttachment), vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    assert_eq!(
        image_layout_to_vk(ImageLayout::DepthStencilAttachment),
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
    );
    assert_eq!(image_layout_to_vk(ImageLayout::PresentSrc), vk::ImageLayout::PRESENT_SRC_KHR);
}

#[test]
fn test_stage_and_access_bits_match_native() {
    assert_eq!(
        stages_to_vk(PipelineStages::COLOR_ATTACHMENT_OUTPUT | PipelineStages::EARLY_FRAGMENT_TESTS),
        vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
    );
    assert_eq!(stages_to_vk(PipelineStages::TOP_OF_PIPE), vk::PipelineStageFlags::TOP_OF_PIPE);
    assert_eq!(stages_to_vk(PipelineStages::ALL_COMMANDS), vk::PipelineStageFlags::ALL_COMMANDS);
    assert_eq!(
        access_to_vk(AccessFlags::COLOR_ATTACHMENT_WRITE),
        vk::AccessFlags::COLOR_ATTACHMENT_WRITE
    );
    assert_eq!(
        access_to_vk(AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE),
        vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
    );
    assert_eq!(access_to_vk(AccessFlags::TRANSFER_WRITE), vk::AccessFlags::TRANSFER_WRITE);
}

#[test]
fn test_attachment_description() {
    let attachment = Attachment::builder(Format::B8G8R8A8_SRGB)
        .clear(ClearValue::Color([0.0, 0.0, 0.0, 1.0]))
        .final_layout(ImageLayout::PresentSrc)
        .build()
        .unwrap();

    let description = attachment_description(&attachment);

    assert_eq!(description.format, vk::Format::B8G8R8A8_SRGB);
    assert_eq!(description.samples, vk::SampleCountFlags::TYPE_1);
    assert_eq!(description.load_op, vk::AttachmentLoadOp::CLEAR);
    assert_eq!(description.store_op, vk::AttachmentStoreOp::STORE);
    assert_eq!(description.initial_layout, vk::ImageLayout::UNDEFINED);
    assert_eq!(description.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
}

#[test]
fn test_subpass_dependency_external() {
    let dependency = Dependency::new(SubpassRef::External, SubpassRef::Index(0))
        .source(PipelineStages::COLOR_ATTACHMENT_OUTPUT, AccessFlags::empty())
        .destination(PipelineStages::COLOR_ATTACHMENT_OUTPUT, AccessFlags::COLOR_ATTACHMENT_WRITE)
        .by_region();

    let native = subpass_dependency(&dependency);

    assert_eq!(native.src_subpass, vk::SUBPASS_EXTERNAL);
    assert_eq!(native.dst_subpass, 0);
    assert_eq!(native.src_stage_mask, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
    assert_eq!(native.src_access_mask, vk::AccessFlags::empty());
    assert_eq!(native.dst_access_mask, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
    assert_eq!(native.dependency_flags, vk::DependencyFlags::BY_REGION);
}

#[test]
fn test_clear_values() {
    let color = clear_value_to_vk(Some(ClearValue::Color([0.25, 0.5, 0.75, 1.0])));
    let depth = clear_value_to_vk(Some(ClearValue::DepthStencil { depth: 1.0, stencil: 7 }));
    unsafe {
        assert_eq!(color.color.float32, [0.25, 0.5, 0.75, 1.0]);
        assert_eq!(depth.depth_stencil.depth, 1.0);
        assert_eq!(depth.depth_stencil.stencil, 7);
    }
}

// ============================================================================
// SURFACE ENUM TESTS
// ============================================================================

#[test]
fn test_present_modes_round_trip() {
    for mode in [PresentMode::Immediate, PresentMode::Mailbox, PresentMode::Fifo, PresentMode::FifoRelaxed] {
        assert_eq!(present_mode_from_vk(present_mode_to_vk(mode)), Some(mode));
    }
    assert_eq!(present_mode_from_vk(vk::PresentModeKHR::SHARED_DEMAND_REFRESH), None);
}

#[test]
fn test_composite_alpha_flags() {
    let flags = vk::CompositeAlphaFlagsKHR::OPAQUE | vk::CompositeAlphaFlagsKHR::INHERIT;
    assert_eq!(composite_alphas_from_vk(flags), vec![CompositeAlpha::Opaque, CompositeAlpha::Inherit]);
    assert_eq!(composite_alpha_to_vk(CompositeAlpha::PreMultiplied), vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED);
}

#[test]
fn test_transform_flags() {
    let flags = vk::SurfaceTransformFlagsKHR::IDENTITY | vk::SurfaceTransformFlagsKHR::ROTATE_90;
    assert_eq!(transforms_from_vk(flags), vec![SurfaceTransform::Identity, SurfaceTransform::Rotate90]);
    assert_eq!(transform_from_vk(vk::SurfaceTransformFlagsKHR::ROTATE_180), SurfaceTransform::Rotate180);
    assert_eq!(transform_to_vk(SurfaceTransform::Rotate270), vk::SurfaceTransformFlagsKHR::ROTATE_270);
}

// ============================================================================
// ERROR MAPPING TESTS
// ============================================================================

#[test]
fn test_vk_error_mapping() {
    assert_eq!(vk_error("submit", vk::Result::ERROR_DEVICE_LOST), Error::DeviceLost);
    assert_eq!(vk_error("allocate", vk::Result::ERROR_OUT_OF_HOST_MEMORY), Error::OutOfMemory);
    assert_eq!(vk_error("allocate", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY), Error::OutOfMemory);
    assert!(matches!(
        vk_error("create fence", vk::Result::ERROR_INITIALIZATION_FAILED),
        Error::BackendError(msg) if msg.contains("create fence")
    ));
}

#[test]
fn test_raw_handle_round_trip() {
    let semaphore: vk::Semaphore = from_raw(0xdead_beef);
    assert_eq!(to_raw(semaphore), 0xdead_beef);
}
