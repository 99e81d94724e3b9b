//! Layered controllers with overwrite blending.
//!
//! Layers are evaluated bottom-up. Each layer's pose is lerped over the result below it by
//! the layer weight; targets nothing below has written take the layer value as-is.

use std::sync::Arc;

use hashbrown::HashSet;

use crate::controller::Controller;
use crate::data::CurveKind;
use crate::error::GraphError;
use crate::ids::LayerId;
use crate::interp::{lerp_into, nlerp_quat_into};
use crate::parameters::ParamValue;
use crate::pose::{Pose, TargetTable};

#[derive(Debug)]
pub struct AnimLayer {
    name: String,
    controller: Controller,
    weight: f32,
    /// Allowed target paths; `None` passes everything.
    mask: Option<HashSet<String>>,
    /// Stack target index for each of the controller's targets.
    remap: Vec<usize>,
    allowed: Vec<bool>,
}

impl AnimLayer {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    #[inline]
    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    #[inline]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn mask(&self) -> Option<&HashSet<String>> {
        self.mask.as_ref()
    }

    fn refresh_allowed(&mut self) {
        let table = self.controller.target_table();
        self.allowed = (0..table.len())
            .map(|i| {
                self.mask
                    .as_ref()
                    .map_or(true, |mask| mask.contains(table.name(i)))
            })
            .collect();
    }
}

#[derive(Debug)]
pub struct LayerStack {
    layers: Vec<AnimLayer>,
    table: Arc<TargetTable>,
    pose: Pose,
    scratch: Vec<f32>,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStack {
    pub fn new() -> Self {
        let table = Arc::new(TargetTable::new());
        Self {
            layers: Vec::new(),
            pose: Pose::new(table.clone()),
            table,
            scratch: Vec::new(),
        }
    }

    /// Add a layer on top. Targets shared with lower layers must agree on width.
    pub fn push_layer(
        &mut self,
        name: impl Into<String>,
        controller: Controller,
        weight: f32,
    ) -> Result<LayerId, GraphError> {
        let mut table = (*self.table).clone();
        let source = controller.target_table().clone();
        let remap = (0..source.len())
            .map(|i| table.insert(source.name(i), source.width(i), source.kind(i)))
            .collect::<Result<Vec<_>, _>>()?;

        self.table = Arc::new(table);
        self.pose = Pose::new(self.table.clone());
        let id = LayerId(self.layers.len() as u32);
        let mut layer = AnimLayer {
            name: name.into(),
            controller,
            weight: weight.clamp(0.0, 1.0),
            mask: None,
            remap,
            allowed: Vec::new(),
        };
        layer.refresh_allowed();
        self.layers.push(layer);
        Ok(id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&AnimLayer> {
        self.layers.get(id.0 as usize)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut AnimLayer> {
        self.layers.get_mut(id.0 as usize)
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&AnimLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Weight is clamped to [0, 1]. Returns false for an unknown layer.
    pub fn set_weight(&mut self, id: LayerId, weight: f32) -> bool {
        match self.layers.get_mut(id.0 as usize) {
            Some(layer) => {
                layer.weight = weight.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    /// Restrict a layer to `targets`; `None` clears the mask.
    pub fn set_mask<I, S>(&mut self, id: LayerId, targets: Option<I>) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.layers.get_mut(id.0 as usize) {
            Some(layer) => {
                layer.mask = targets.map(|t| t.into_iter().map(Into::into).collect());
                layer.refresh_allowed();
                true
            }
            None => false,
        }
    }

    /// Set `name` on every layer. All layers are written; the first error is returned.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), GraphError> {
        let mut first_err = None;
        for layer in &mut self.layers {
            if let Err(err) = layer.controller.set_parameter(name, value) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn update(&mut self, dt: f32) {
        for layer in &mut self.layers {
            layer.controller.update(dt);
        }
        self.compose();
    }

    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    fn compose(&mut self) {
        self.pose.clear();
        for layer in &self.layers {
            let source = layer.controller.current_pose();
            for (i, &target) in layer.remap.iter().enumerate() {
                if !layer.allowed[i] {
                    continue;
                }
                let Some(value) = source.value(i) else {
                    continue;
                };
                let Some(lower) = self.pose.value(target) else {
                    self.pose.set(target, value);
                    continue;
                };
                self.scratch.resize(value.len(), 0.0);
                if self.table.kind(target) == CurveKind::Quaternion {
                    nlerp_quat_into(lower, value, layer.weight, &mut self.scratch);
                } else {
                    lerp_into(lower, value, layer.weight, &mut self.scratch);
                }
                self.pose.set(target, &self.scratch);
            }
        }
    }
}
