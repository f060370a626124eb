//! Packing of hole records into a GPU data texture.
//!
//! Each hole occupies one fixed-size record of RGBA32F texels. Records are
//! laid out row-major, at most [`MAX_HOLES_PER_ROW`] per texture row, so hole
//! `i` lives at texel column `(i % holes_per_row) * texels_per_hole` of row
//! `i / holes_per_row`, and its floats are contiguous in the CPU buffer.
//!
//! Record layout: slots 0..3 hold the local position, followed by one slot
//! per [`HoleField`] the active model declares. Trailing slots are zero.

use std::ops::Range;

use crate::coords::WorldOffset;
use crate::error::{AnalyticsError, Result};
use crate::hole::HoleRecord;
use crate::model::HoleField;
use crate::options::EncodeOptions;

/// Floats per RGBA32F texel.
pub const FLOATS_PER_TEXEL: usize = 4;
/// Records per texture row.
pub const MAX_HOLES_PER_ROW: usize = 512;
/// Texture rows.
pub const MAX_HOLE_ROWS: usize = 512;
/// Largest number of holes a packed texture can hold.
pub const MAX_HOLE_CAPACITY: usize = MAX_HOLES_PER_ROW * MAX_HOLE_ROWS;
/// Capacity of a freshly created texture.
pub const MIN_HOLE_CAPACITY: usize = 64;

/// Slots taken by the position at the start of every record.
const POSITION_SLOTS: usize = 3;

/// Which per-hole fields a record carries, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleLayout {
    fields: Vec<HoleField>,
}

impl HoleLayout {
    /// Builds a layout from a model's declared inputs, dropping duplicates.
    pub fn for_fields(inputs: &[HoleField]) -> Self {
        let mut fields = Vec::with_capacity(inputs.len());
        for &field in inputs {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        Self { fields }
    }

    pub fn fields(&self) -> &[HoleField] {
        &self.fields
    }

    /// Float slot holding `field`, if the layout carries it.
    pub fn slot_of(&self, field: HoleField) -> Option<usize> {
        self.fields
            .iter()
            .position(|&f| f == field)
            .map(|i| POSITION_SLOTS + i)
    }

    pub fn texels_per_hole(&self) -> usize {
        (POSITION_SLOTS + self.fields.len()).div_ceil(FLOATS_PER_TEXEL)
    }

    pub fn floats_per_hole(&self) -> usize {
        self.texels_per_hole() * FLOATS_PER_TEXEL
    }
}

/// CPU mirror of the hole data texture.
#[derive(Debug, Clone)]
pub struct PackedHoleTexture {
    data: Vec<f32>,
    texels_per_hole: usize,
    holes_per_row: usize,
    rows: usize,
    hole_count: usize,
}

impl PackedHoleTexture {
    fn with_capacity(texels_per_hole: usize, capacity: usize) -> Self {
        let holes_per_row = capacity.min(MAX_HOLES_PER_ROW);
        let rows = capacity.div_ceil(holes_per_row);
        Self {
            data: vec![0.0; holes_per_row * rows * texels_per_hole * FLOATS_PER_TEXEL],
            texels_per_hole,
            holes_per_row,
            rows,
            hole_count: 0,
        }
    }

    /// Number of holes the current allocation can hold.
    pub fn capacity(&self) -> usize {
        self.holes_per_row * self.rows
    }

    pub fn hole_count(&self) -> usize {
        self.hole_count
    }

    pub fn texels_per_hole(&self) -> usize {
        self.texels_per_hole
    }

    pub fn holes_per_row(&self) -> usize {
        self.holes_per_row
    }

    /// Texture width in texels.
    pub fn width(&self) -> usize {
        self.holes_per_row * self.texels_per_hole
    }

    /// Texture height in texels.
    pub fn height(&self) -> usize {
        self.rows
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Float range of record `index` within [`data`](Self::data).
    pub fn record_range(&self, index: usize) -> Range<usize> {
        let len = self.texels_per_hole * FLOATS_PER_TEXEL;
        index * len..(index + 1) * len
    }

    pub fn record(&self, index: usize) -> &[f32] {
        &self.data[self.record_range(index)]
    }

    /// Texel coordinate of the first texel of record `index`.
    pub fn record_origin(&self, index: usize) -> (usize, usize) {
        (
            (index % self.holes_per_row) * self.texels_per_hole,
            index / self.holes_per_row,
        )
    }

    fn record_mut(&mut self, index: usize) -> &mut [f32] {
        let range = self.record_range(index);
        &mut self.data[range]
    }
}

/// Result of a full pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackOutcome {
    /// Contents rewritten in the existing allocation.
    Rewritten,
    /// The texture was reallocated; GPU storage must be recreated.
    Reallocated,
}

/// Result of a single-record update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowUpdate {
    /// Exactly this record changed.
    Row(usize),
    /// The index lies beyond capacity; nothing was written and a full pack
    /// is required.
    NeedsRepack,
}

/// Capacity for `count` holes: the next power of two, at least
/// [`MIN_HOLE_CAPACITY`].
fn capacity_for(count: usize) -> usize {
    count.max(MIN_HOLE_CAPACITY).next_power_of_two()
}

/// Encodes hole records for the active model.
#[derive(Debug, Clone)]
pub struct HoleEncoder {
    layout: HoleLayout,
    world_offset: WorldOffset,
    texture: PackedHoleTexture,
}

impl HoleEncoder {
    pub fn new(layout: HoleLayout) -> Self {
        let texture = PackedHoleTexture::with_capacity(layout.texels_per_hole(), MIN_HOLE_CAPACITY);
        Self {
            layout,
            world_offset: WorldOffset::ZERO,
            texture,
        }
    }

    pub fn layout(&self) -> &HoleLayout {
        &self.layout
    }

    pub fn texture(&self) -> &PackedHoleTexture {
        &self.texture
    }

    pub fn world_offset(&self) -> WorldOffset {
        self.world_offset
    }

    /// Sets the local origin used by subsequent encodes.
    ///
    /// Already encoded records are not touched; callers repack.
    pub fn set_world_offset(&mut self, offset: WorldOffset) {
        self.world_offset = offset;
    }

    /// Rebuilds the whole texture from `holes`.
    pub fn pack(&mut self, holes: &[HoleRecord], options: &EncodeOptions) -> Result<PackOutcome> {
        if holes.len() > MAX_HOLE_CAPACITY {
            return Err(AnalyticsError::Capacity {
                requested: holes.len(),
                capacity: MAX_HOLE_CAPACITY,
            });
        }

        let outcome = if holes.len() > self.texture.capacity() {
            let capacity = capacity_for(holes.len());
            log::debug!(
                "growing hole texture from {} to {capacity} records",
                self.texture.capacity()
            );
            self.texture = PackedHoleTexture::with_capacity(self.layout.texels_per_hole(), capacity);
            PackOutcome::Reallocated
        } else {
            PackOutcome::Rewritten
        };

        for (i, hole) in holes.iter().enumerate() {
            let record = self.texture.record_range(i);
            encode_record(
                &self.layout,
                self.world_offset,
                hole,
                options,
                &mut self.texture.data[record],
            );
        }
        let used = holes.len() * self.layout.floats_per_hole();
        self.texture.data[used..].fill(0.0);
        self.texture.hole_count = holes.len();

        Ok(outcome)
    }

    /// Overwrites record `index`, leaving every other record untouched.
    ///
    /// `index` may equal the current hole count to append one hole.
    pub fn update_single_hole(
        &mut self,
        index: usize,
        hole: &HoleRecord,
        options: &EncodeOptions,
    ) -> Result<RowUpdate> {
        if index >= MAX_HOLE_CAPACITY {
            return Err(AnalyticsError::Capacity {
                requested: index + 1,
                capacity: MAX_HOLE_CAPACITY,
            });
        }
        if index > self.texture.hole_count {
            return Err(AnalyticsError::HoleIndexOutOfRange {
                index,
                count: self.texture.hole_count,
            });
        }
        if index >= self.texture.capacity() {
            return Ok(RowUpdate::NeedsRepack);
        }

        let layout = &self.layout;
        let offset = self.world_offset;
        encode_record(layout, offset, hole, options, self.texture.record_mut(index));
        if index == self.texture.hole_count {
            self.texture.hole_count += 1;
        }
        Ok(RowUpdate::Row(index))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn encode_record(
    layout: &HoleLayout,
    offset: WorldOffset,
    hole: &HoleRecord,
    options: &EncodeOptions,
    out: &mut [f32],
) {
    out.fill(0.0);
    if options.skip_hidden && !hole.visible {
        return;
    }

    let anchor = if options.use_toe_location {
        hole.toe
    } else {
        hole.collar
    };
    out[..POSITION_SLOTS].copy_from_slice(&offset.to_local(anchor).to_array());

    let column = hole.charge_column();
    let local_z = |depth: f64| (hole.point_at_depth(depth).z - offset.0.z) as f32;

    for (i, field) in layout.fields().iter().enumerate() {
        out[POSITION_SLOTS + i] = match field {
            HoleField::ChargeMass => hole.total_charge_mass() as f32,
            HoleField::ChargeTop => column.map_or(0.0, |(top, _)| local_z(top)),
            HoleField::ChargeBase => column.map_or(0.0, |(_, base)| local_z(base)),
            HoleField::ChargeLength => hole.charged_length() as f32,
            HoleField::LinearDensity => hole.linear_charge_density() as f32,
            HoleField::FireTime => hole.first_fire_time().unwrap_or(0.0) as f32,
            HoleField::Diameter => (hole.diameter_mm / 1000.0) as f32,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hole::ChargeDeck;
    use glam::DVec3;
    use proptest::prelude::*;

    fn hole_at(x: f64, y: f64, mass: f64) -> HoleRecord {
        HoleRecord::new(
            format!("{x}/{y}"),
            DVec3::new(x, y, 100.0),
            DVec3::new(x, y, 88.0),
            115.0,
        )
        .with_deck(ChargeDeck {
            top_depth: 4.0,
            base_depth: 12.0,
            mass_kg: mass,
            fire_time_ms: x,
        })
    }

    fn encoder() -> HoleEncoder {
        HoleEncoder::new(HoleLayout::for_fields(&[
            HoleField::ChargeMass,
            HoleField::ChargeTop,
            HoleField::ChargeBase,
            HoleField::FireTime,
            HoleField::Diameter,
        ]))
    }

    #[test]
    fn test_layout_slots() {
        let layout = HoleLayout::for_fields(&[HoleField::ChargeMass, HoleField::ChargeMass]);
        assert_eq!(layout.fields(), &[HoleField::ChargeMass]);
        assert_eq!(layout.slot_of(HoleField::ChargeMass), Some(3));
        assert_eq!(layout.texels_per_hole(), 1);

        let layout = HoleLayout::for_fields(&[HoleField::ChargeMass, HoleField::FireTime]);
        assert_eq!(layout.texels_per_hole(), 2);
        assert_eq!(layout.floats_per_hole(), 8);
        assert_eq!(layout.slot_of(HoleField::Diameter), None);
    }

    #[test]
    fn test_pack_encodes_relative_to_offset() {
        let mut enc = encoder();
        enc.set_world_offset(WorldOffset::new(1000.0, 2000.0, 90.0));
        let holes = vec![hole_at(1010.0, 2020.0, 80.0)];
        enc.pack(&holes, &EncodeOptions::default()).unwrap();

        let record = enc.texture().record(0);
        assert_eq!(&record[..3], &[10.0, 20.0, 10.0]);
        assert_eq!(record[3], 80.0);
        assert_eq!(record[4], 6.0); // top at depth 4 -> z 96
        assert_eq!(record[5], -2.0); // base at depth 12 -> z 88
        assert_eq!(record[6], 1010.0);
        assert!((record[7] - 0.115).abs() < 1e-6);
    }

    #[test]
    fn test_toe_location() {
        let mut enc = encoder();
        let options = EncodeOptions {
            use_toe_location: true,
            ..EncodeOptions::default()
        };
        enc.pack(&[hole_at(1.0, 2.0, 10.0)], &options).unwrap();
        assert_eq!(&enc.texture().record(0)[..3], &[1.0, 2.0, 88.0]);
    }

    #[test]
    fn test_hidden_holes_included_unless_skipped() {
        let mut hidden = hole_at(5.0, 5.0, 10.0);
        hidden.visible = false;

        let mut enc = encoder();
        enc.pack(std::slice::from_ref(&hidden), &EncodeOptions::default())
            .unwrap();
        assert_eq!(enc.texture().record(0)[3], 10.0);

        let options = EncodeOptions {
            skip_hidden: true,
            ..EncodeOptions::default()
        };
        enc.pack(&[hidden], &options).unwrap();
        assert!(enc.texture().record(0).iter().all(|&v| v == 0.0));
        assert_eq!(enc.texture().hole_count(), 1);
    }

    #[test]
    fn test_repack_zero_fills_stale_rows() {
        let mut enc = encoder();
        let holes: Vec<_> = (0..10).map(|i| hole_at(f64::from(i), 0.0, 5.0)).collect();
        enc.pack(&holes, &EncodeOptions::default()).unwrap();
        let outcome = enc.pack(&holes[..3], &EncodeOptions::default()).unwrap();

        assert_eq!(outcome, PackOutcome::Rewritten);
        assert_eq!(enc.texture().hole_count(), 3);
        for i in 3..enc.texture().capacity() {
            assert!(enc.texture().record(i).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_pack_grows_capacity() {
        let mut enc = encoder();
        assert_eq!(enc.texture().capacity(), MIN_HOLE_CAPACITY);
        let holes: Vec<_> = (0..700).map(|i| hole_at(f64::from(i), 0.0, 1.0)).collect();

        let outcome = enc.pack(&holes, &EncodeOptions::default()).unwrap();
        assert_eq!(outcome, PackOutcome::Reallocated);

        let texture = enc.texture();
        assert_eq!(texture.capacity(), 1024);
        assert_eq!(texture.holes_per_row(), MAX_HOLES_PER_ROW);
        assert_eq!(texture.height(), 2);
        assert_eq!(texture.width(), MAX_HOLES_PER_ROW * 2);
        assert_eq!(texture.record_origin(513), (2, 1));
        assert_eq!(texture.record(699)[0], 699.0);
    }

    #[test]
    fn test_pack_beyond_ceiling_is_capacity_error() {
        let mut enc = HoleEncoder::new(HoleLayout::for_fields(&[]));
        let hole = hole_at(0.0, 0.0, 1.0);
        enc.pack(&[hole.clone()], &EncodeOptions::default()).unwrap();

        let holes = vec![hole; MAX_HOLE_CAPACITY + 1];
        let err = enc.pack(&holes, &EncodeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::Capacity { requested, capacity }
                if requested == MAX_HOLE_CAPACITY + 1 && capacity == MAX_HOLE_CAPACITY
        ));
        // Nothing was truncated or overwritten.
        assert_eq!(enc.texture().hole_count(), 1);
        assert_eq!(enc.texture().capacity(), MIN_HOLE_CAPACITY);
    }

    #[test]
    fn test_update_single_hole_append_and_repack_signal() {
        let mut enc = encoder();
        let holes: Vec<_> = (0..MIN_HOLE_CAPACITY)
            .map(|i| hole_at(i as f64, 0.0, 1.0))
            .collect();
        enc.pack(&holes[..2], &EncodeOptions::default()).unwrap();

        let update = enc
            .update_single_hole(2, &holes[2], &EncodeOptions::default())
            .unwrap();
        assert_eq!(update, RowUpdate::Row(2));
        assert_eq!(enc.texture().hole_count(), 3);

        assert!(matches!(
            enc.update_single_hole(10, &holes[0], &EncodeOptions::default()),
            Err(AnalyticsError::HoleIndexOutOfRange { index: 10, count: 3 })
        ));

        enc.pack(&holes, &EncodeOptions::default()).unwrap();
        let update = enc
            .update_single_hole(MIN_HOLE_CAPACITY, &holes[0], &EncodeOptions::default())
            .unwrap();
        assert_eq!(update, RowUpdate::NeedsRepack);
        assert_eq!(enc.texture().hole_count(), MIN_HOLE_CAPACITY);
    }

    proptest! {
        #[test]
        fn prop_single_update_leaves_other_records_identical(
            count in 1usize..200,
            pick in any::<prop::sample::Index>(),
            x in -1.0e5f64..1.0e5,
            mass in 0.0f64..500.0,
        ) {
            let mut enc = encoder();
            let holes: Vec<_> = (0..count)
                .map(|i| hole_at(i as f64 * 3.0, i as f64, 10.0 + i as f64))
                .collect();
            enc.pack(&holes, &EncodeOptions::default()).unwrap();
            let before = enc.texture().as_bytes().to_vec();

            let index = pick.index(count);
            let update = enc
                .update_single_hole(index, &hole_at(x, -x, mass), &EncodeOptions::default())
                .unwrap();
            prop_assert_eq!(update, RowUpdate::Row(index));

            let after = enc.texture().as_bytes();
            let bytes_per_record = enc.layout().floats_per_hole() * 4;
            for i in 0..enc.texture().capacity() {
                if i == index {
                    continue;
                }
                let range = i * bytes_per_record..(i + 1) * bytes_per_record;
                prop_assert_eq!(&before[range.clone()], &after[range]);
            }
            prop_assert_eq!(enc.texture().hole_count(), count);
        }
    }
}
