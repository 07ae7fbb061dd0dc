/// Render pass graph: attachments, subpasses, dependencies
///
/// Builders accumulate plain values and hand back finished, immutable
/// records. `RenderPassBuilder::build` validates the whole graph, flattens it
/// into a `RenderPassLayout` and realizes it as a single device object.

use std::sync::Arc;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::graphics_device::{
    AccessFlags, ClearValue, Format, GraphicsDevice, ImageLayout, LoadOp, PipelineStages,
    RenderPassHandle, SampleCount, StoreOp,
};

// ============================================================================
// Attachment
// ============================================================================

/// Index of an attachment inside its render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(u32);

impl AttachmentId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Description of one image used by a render pass
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    format: Format,
    samples: SampleCount,
    load_op: LoadOp,
    store_op: StoreOp,
    stencil_load_op: LoadOp,
    stencil_store_op: StoreOp,
    initial_layout: ImageLayout,
    final_layout: ImageLayout,
    clear: Option<ClearValue>,
}

impl Attachment {
    pub fn builder(format: Format) -> AttachmentBuilder {
        AttachmentBuilder::new(format)
    }

    pub fn format(&self) -> Format { self.format }
    pub fn samples(&self) -> SampleCount { self.samples }
    pub fn load_op(&self) -> LoadOp { self.load_op }
    pub fn store_op(&self) -> StoreOp { self.store_op }
    pub fn stencil_load_op(&self) -> LoadOp { self.stencil_load_op }
    pub fn stencil_store_op(&self) -> StoreOp { self.stencil_store_op }
    pub fn initial_layout(&self) -> ImageLayout { self.initial_layout }
    pub fn final_layout(&self) -> ImageLayout { self.final_layout }
    pub fn clear_value(&self) -> Option<ClearValue> { self.clear }
}

/// Builder for `Attachment`
///
/// Defaults: one sample, don't-care load, store, undefined initial layout and
/// a final layout matching the format (colour or depth attachment).
#[derive(Debug, Clone)]
pub struct AttachmentBuilder {
    attachment: Attachment,
}

impl AttachmentBuilder {
    pub fn new(format: Format) -> Self {
        let final_layout = if format.is_depth() {
            ImageLayout::DepthStencilAttachment
        } else {
            ImageLayout::ColorAttachment
        };
        Self {
            attachment: Attachment {
                format,
                samples: SampleCount::S1,
                load_op: LoadOp::DontCare,
                store_op: StoreOp::Store,
                stencil_load_op: LoadOp::DontCare,
                stencil_store_op: StoreOp::DontCare,
                initial_layout: ImageLayout::Undefined,
                final_layout,
                clear: None,
            },
        }
    }

    pub fn samples(mut self, samples: SampleCount) -> Self {
        self.attachment.samples = samples;
        self
    }

    pub fn load_op(mut self, load_op: LoadOp) -> Self {
        self.attachment.load_op = load_op;
        self
    }

    pub fn store_op(mut self, store_op: StoreOp) -> Self {
        self.attachment.store_op = store_op;
        self
    }

    pub fn stencil_load_op(mut self, load_op: LoadOp) -> Self {
        self.attachment.stencil_load_op = load_op;
        self
    }

    pub fn stencil_store_op(mut self, store_op: StoreOp) -> Self {
        self.attachment.stencil_store_op = store_op;
        self
    }

    pub fn initial_layout(mut self, layout: ImageLayout) -> Self {
        self.attachment.initial_layout = layout;
        self
    }

    pub fn final_layout(mut self, layout: ImageLayout) -> Self {
        self.attachment.final_layout = layout;
        self
    }

    /// Clear policy; also switches the load op to `Clear`
    pub fn clear(mut self, value: ClearValue) -> Self {
        self.attachment.load_op = LoadOp::Clear;
        self.attachment.clear = Some(value);
        self
    }

    /// Validate and produce the attachment
    ///
    /// # Errors
    ///
    /// `Error::InvalidAttachment` when:
    /// - the final layout is `Undefined` or `Preinitialized`
    /// - the initial layout is `Undefined` but contents are loaded
    /// - a `Clear` load op has no clear value, or the clear value kind does
    ///   not match the format
    pub fn build(self) -> Result<Attachment> {
        let a = self.attachment;

        if !a.final_layout.is_valid_final() {
            return Err(Error::InvalidAttachment(format!(
                "{:?} attachment: final layout {:?} is not allowed",
                a.format, a.final_layout
            )));
        }

        let loads_stencil = a.format.has_stencil() && a.stencil_load_op == LoadOp::Load;
        if a.initial_layout == ImageLayout::Undefined && (a.load_op == LoadOp::Load || loads_stencil) {
            return Err(Error::InvalidAttachment(format!(
                "{:?} attachment: cannot load contents from an Undefined initial layout",
                a.format
            )));
        }

        let clears_stencil = a.format.has_stencil() && a.stencil_load_op == LoadOp::Clear;
        if (a.load_op == LoadOp::Clear || clears_stencil) && a.clear.is_none() {
            return Err(Error::InvalidAttachment(format!(
                "{:?} attachment: Clear load op requires a clear value",
                a.format
            )));
        }

        if let Some(clear) = a.clear {
            if !clear.matches_format(a.format) {
                return Err(Error::InvalidAttachment(format!(
                    "{:?} attachment: clear value {:?} does not match the format",
                    a.format, clear
                )));
            }
        }

        Ok(a)
    }
}

// ============================================================================
// Subpass
// ============================================================================

/// Use of an attachment by a subpass, in a given layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentReference {
    pub attachment: AttachmentId,
    pub layout: ImageLayout,
}

/// Finished subpass record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subpass {
    colors: Vec<AttachmentReference>,
    depth_stencil: Option<AttachmentReference>,
}

impl Subpass {
    pub fn builder() -> SubpassBuilder {
        SubpassBuilder::default()
    }

    pub fn colors(&self) -> &[AttachmentReference] {
        &self.colors
    }

    pub fn depth_stencil(&self) -> Option<&AttachmentReference> {
        self.depth_stencil.as_ref()
    }
}

/// Accumulates attachment references for one subpass
#[derive(Debug, Clone, Default)]
pub struct SubpassBuilder {
    subpass: Subpass,
}

impl SubpassBuilder {
    /// Add a colour reference in `ColorAttachment` layout
    pub fn color(self, attachment: AttachmentId) -> Self {
        self.color_with_layout(attachment, ImageLayout::ColorAttachment)
    }

    pub fn color_with_layout(mut self, attachment: AttachmentId, layout: ImageLayout) -> Self {
        self.subpass.colors.push(AttachmentReference { attachment, layout });
        self
    }

    /// Set the depth/stencil reference in `DepthStencilAttachment` layout
    pub fn depth_stencil(self, attachment: AttachmentId) -> Self {
        self.depth_stencil_with_layout(attachment, ImageLayout::DepthStencilAttachment)
    }

    pub fn depth_stencil_with_layout(mut self, attachment: AttachmentId, layout: ImageLayout) -> Self {
        self.subpass.depth_stencil = Some(AttachmentReference { attachment, layout });
        self
    }

    pub fn build(self) -> Subpass {
        self.subpass
    }
}

// ============================================================================
// Dependency
// ============================================================================

/// Endpoint of a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubpassRef {
    /// Work before or after the render pass
    External,
    Index(u32),
}

/// Execution + memory dependency between two subpasses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub src: SubpassRef,
    pub dst: SubpassRef,
    pub src_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_stages: PipelineStages,
    pub dst_access: AccessFlags,
    pub by_region: bool,
}

impl Dependency {
    pub fn new(src: SubpassRef, dst: SubpassRef) -> Self {
        Self {
            src,
            dst,
            src_stages: PipelineStages::empty(),
            src_access: AccessFlags::empty(),
            dst_stages: PipelineStages::empty(),
            dst_access: AccessFlags::empty(),
            by_region: false,
        }
    }

    pub fn source(mut self, stages: PipelineStages, access: AccessFlags) -> Self {
        self.src_stages = stages;
        self.src_access = access;
        self
    }

    pub fn destination(mut self, stages: PipelineStages, access: AccessFlags) -> Self {
        self.dst_stages = stages;
        self.dst_access = access;
        self
    }

    pub fn by_region(mut self) -> Self {
        self.by_region = true;
        self
    }
}

// ============================================================================
// Render pass
// ============================================================================

/// Validated, flattened render pass description handed to the device
///
/// Always holds exactly one entry per declared attachment and subpass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPassLayout {
    pub attachments: Vec<Attachment>,
    pub subpasses: Vec<Subpass>,
    pub dependencies: Vec<Dependency>,
}

/// Accumulates attachments, subpasses and dependencies
#[derive(Debug, Clone, Default)]
pub struct RenderPassBuilder {
    attachments: Vec<Attachment>,
    subpasses: Vec<Subpass>,
    dependencies: Vec<Dependency>,
}

impl RenderPassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attachment; the returned id may be referenced by any subpass
    pub fn attachment(&mut self, attachment: Attachment) -> AttachmentId {
        let id = AttachmentId(self.attachments.len() as u32);
        self.attachments.push(attachment);
        id
    }

    /// Append a subpass, returning its index
    pub fn subpass(&mut self, subpass: Subpass) -> u32 {
        self.subpasses.push(subpass);
        (self.subpasses.len() - 1) as u32
    }

    pub fn dependency(&mut self, dependency: Dependency) -> &mut Self {
        self.dependencies.push(dependency);
        self
    }

    /// Validate the graph and flatten it, without touching a device
    pub fn layout(&self) -> Result<RenderPassLayout> {
        if self.subpasses.is_empty() {
            return Err(Error::InvalidRenderPass("a render pass needs at least one subpass".to_string()));
        }

        for (index, subpass) in self.subpasses.iter().enumerate() {
            self.validate_subpass(index, subpass)?;
        }

        for (index, dependency) in self.dependencies.iter().enumerate() {
            self.validate_dependency(index, dependency)?;
        }

        Ok(RenderPassLayout {
            attachments: self.attachments.clone(),
            subpasses: self.subpasses.clone(),
            dependencies: self.dependencies.clone(),
        })
    }

    /// Validate, flatten and create the device object
    pub fn build(&self, device: Arc<dyn GraphicsDevice>) -> Result<RenderPass> {
        let layout = self.layout()?;
        let handle = device.create_render_pass(&layout)?;
        crate::inflight_debug!(
            "inflight::RenderPass",
            "Created render pass: {} attachment(s), {} subpass(es), {} dependency(ies)",
            layout.attachments.len(),
            layout.subpasses.len(),
            layout.dependencies.len()
        );
        Ok(RenderPass { device, handle, layout })
    }

    fn attachment_format(&self, subpass: usize, reference: &AttachmentReference) -> Result<Format> {
        self.attachments
            .get(reference.attachment.index() as usize)
            .map(|a| a.format())
            .ok_or_else(|| {
                Error::InvalidRenderPass(format!(
                    "subpass {} references attachment {} but only {} are declared",
                    subpass,
                    reference.attachment.index(),
                    self.attachments.len()
                ))
            })
    }

    fn validate_subpass(&self, index: usize, subpass: &Subpass) -> Result<()> {
        if subpass.colors.is_empty() && subpass.depth_stencil.is_none() {
            return Err(Error::InvalidRenderPass(format!(
                "subpass {} has neither colour nor depth attachments",
                index
            )));
        }

        let mut seen = FxHashSet::default();
        for reference in &subpass.colors {
            let format = self.attachment_format(index, reference)?;
            if format.is_depth() {
                return Err(Error::InvalidRenderPass(format!(
                    "subpass {} uses depth attachment {} ({:?}) as a colour attachment",
                    index,
                    reference.attachment.index(),
                    format
                )));
            }
            if !seen.insert(reference.attachment) {
                return Err(Error::InvalidRenderPass(format!(
                    "subpass {} references colour attachment {} twice",
                    index,
                    reference.attachment.index()
                )));
            }
        }

        if let Some(depth) = &subpass.depth_stencil {
            let format = self.attachment_format(index, depth)?;
            if !format.is_depth() {
                return Err(Error::InvalidRenderPass(format!(
                    "subpass {} uses colour attachment {} ({:?}) as depth/stencil",
                    index,
                    depth.attachment.index(),
                    format
                )));
            }
        }

        Ok(())
    }

    fn validate_dependency(&self, index: usize, dependency: &Dependency) -> Result<()> {
        if dependency.src_stages.is_empty() || dependency.dst_stages.is_empty() {
            return Err(Error::InvalidRenderPass(format!(
                "dependency {} has an empty source or destination stage set",
                index
            )));
        }

        let count = self.subpasses.len() as u32;
        for endpoint in [dependency.src, dependency.dst] {
            if let SubpassRef::Index(i) = endpoint {
                if i >= count {
                    return Err(Error::InvalidRenderPass(format!(
                        "dependency {} names subpass {} but only {} exist",
                        index, i, count
                    )));
                }
            }
        }

        match (dependency.src, dependency.dst) {
            (SubpassRef::External, SubpassRef::External) => Err(Error::InvalidRenderPass(format!(
                "dependency {} goes from EXTERNAL to EXTERNAL",
                index
            ))),
            (SubpassRef::Index(src), SubpassRef::Index(dst)) if src > dst => Err(Error::InvalidRenderPass(format!(
                "dependency {} points backwards (subpass {} -> {})",
                index, src, dst
            ))),
            _ => Ok(()),
        }
    }
}

/// Realized render pass
///
/// Owns its device object; destroyed when dropped.
pub struct RenderPass {
    device: Arc<dyn GraphicsDevice>,
    handle: RenderPassHandle,
    layout: RenderPassLayout,
}

impl RenderPass {
    /// Single-subpass pass that clears a colour target and leaves it ready
    /// for presentation, with an optional cleared depth attachment
    pub fn presentable(
        device: Arc<dyn GraphicsDevice>,
        color_format: Format,
        depth_format: Option<Format>,
        clear_color: [f32; 4],
    ) -> Result<RenderPass> {
        let mut builder = RenderPassBuilder::new();

        let color = builder.attachment(
            Attachment::builder(color_format)
                .clear(ClearValue::Color(clear_color))
                .store_op(StoreOp::Store)
                .final_layout(ImageLayout::PresentSrc)
                .build()?,
        );

        let mut subpass = Subpass::builder().color(color);
        let mut stages = PipelineStages::COLOR_ATTACHMENT_OUTPUT;
        let mut access = AccessFlags::COLOR_ATTACHMENT_WRITE;

        if let Some(depth_format) = depth_format {
            let depth = builder.attachment(
                Attachment::builder(depth_format)
                    .clear(ClearValue::DepthStencil { depth: 1.0, stencil: 0 })
                    .store_op(StoreOp::DontCare)
                    .build()?,
            );
            subpass = subpass.depth_stencil(depth);
            stages |= PipelineStages::EARLY_FRAGMENT_TESTS;
            access |= AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
        }

        let index = builder.subpass(subpass.build());
        builder.dependency(
            Dependency::new(SubpassRef::External, SubpassRef::Index(index))
                .source(stages, AccessFlags::empty())
                .destination(stages, access),
        );

        builder.build(device)
    }

    pub fn handle(&self) -> RenderPassHandle {
        self.handle
    }

    pub fn layout(&self) -> &RenderPassLayout {
        &self.layout
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.layout.attachments
    }

    pub fn subpass_count(&self) -> usize {
        self.layout.subpasses.len()
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }
}

impl std::fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPass")
            .field("handle", &self.handle)
            .field("layout", &self.layout)
            .finish()
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        self.device.destroy_render_pass(self.handle);
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
