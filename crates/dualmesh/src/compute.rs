use super::*;
use rayon::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub struct SiteData<T> {
    pub data: Vec<T>,
}

impl<T> SiteData<T> {
    pub fn for_each(mesh: &DualMesh, mut f: impl FnMut(SiteId, &Site) -> T) -> Self {
        Self {
            data: mesh.sites().map(|(id, site)| f(id, site)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SiteId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(idx, t)| (SiteId(idx), t))
    }

    pub fn update_each(&mut self, mesh: &DualMesh, mut f: impl FnMut(SiteId, &Site, &mut T)) {
        for ((site_id, site), data) in mesh.sites().zip(self.data.iter_mut()) {
            f(site_id, site, data)
        }
    }

    pub fn transform<U>(&self, mut f: impl FnMut(SiteId, &T) -> U) -> SiteData<U> {
        SiteData {
            data: self
                .data
                .iter()
                .enumerate()
                .map(|(idx, t)| f(SiteId(idx), t))
                .collect(),
        }
    }

    /// Site ids sorted by `compare`, ties broken by ascending id so the order is
    /// reproducible.
    pub fn ordered_by(&self, mut compare: impl FnMut(&T, &T) -> std::cmp::Ordering) -> Vec<SiteId> {
        let mut temporary: Vec<_> = (0..self.data.len()).map(SiteId).collect();
        temporary.sort_by(|&id1, &id2| {
            let t1 = &self.data[id1.0];
            let t2 = &self.data[id2.0];
            compare(t1, t2).then_with(|| id1.cmp(&id2))
        });
        temporary
    }
}

impl<T: Clone> SiteData<T> {
    pub fn uniform(mesh: &DualMesh, value: T) -> Self {
        Self {
            data: vec![value; mesh.num_sites()],
        }
    }
}

impl<T: Send> SiteData<T> {
    /// Same as `update_each`, spread over the rayon pool. Each site only sees its
    /// own slot, so `f` cannot observe neighbors mid-update.
    pub fn par_update_each(&mut self, mesh: &DualMesh, f: impl Fn(SiteId, &Site, &mut T) + Sync) {
        self.data
            .par_iter_mut()
            .zip(mesh.sites.par_iter())
            .enumerate()
            .for_each(|(idx, (data, site))| f(SiteId(idx), site, data))
    }
}

impl SiteData<f64> {
    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

impl<T> From<Vec<T>> for SiteData<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

impl<T> std::ops::Index<SiteId> for SiteData<T> {
    type Output = T;
    fn index(&self, index: SiteId) -> &Self::Output {
        &self.data[index.0]
    }
}
impl<T> std::ops::IndexMut<SiteId> for SiteData<T> {
    fn index_mut(&mut self, index: SiteId) -> &mut Self::Output {
        &mut self.data[index.0]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CornerData<T> {
    pub data: Vec<T>,
}

impl<T> CornerData<T> {
    pub fn for_each(mesh: &DualMesh, mut f: impl FnMut(CornerId, &Corner) -> T) -> Self {
        Self {
            data: mesh.corners().map(|(id, c)| f(id, c)).collect(),
        }
    }

    pub fn from_site_data<U>(
        mesh: &DualMesh,
        site_data: &SiteData<U>,
        mut f: impl FnMut(CornerId, &Corner, &[(SiteId, &U)]) -> T,
    ) -> Self {
        let mut buf = Vec::with_capacity(8);

        Self {
            data: mesh
                .corners()
                .map(|(id, corner)| {
                    buf.clear();
                    corner.sites().iter().for_each(|&site_id| {
                        buf.push((site_id, &site_data[site_id]));
                    });
                    f(id, corner, buf.as_slice())
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CornerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(idx, t)| (CornerId(idx), t))
    }
}

impl CornerData<f64> {
    /// Mean of the incident sites' values. A corner no triangle touches has
    /// nothing to average and reads as NaN.
    pub fn site_average(mesh: &DualMesh, sites: &SiteData<f64>) -> Self {
        CornerData::from_site_data(mesh, sites, |_, _, s_data| {
            if s_data.is_empty() {
                return f64::NAN;
            }
            let total: f64 = s_data.iter().map(|(_, v)| **v).sum();
            total / s_data.len() as f64
        })
    }
}

impl<T> std::ops::Index<CornerId> for CornerData<T> {
    type Output = T;
    fn index(&self, index: CornerId) -> &Self::Output {
        &self.data[index.0]
    }
}
impl<T> std::ops::IndexMut<CornerId> for CornerData<T> {
    fn index_mut(&mut self, index: CornerId) -> &mut Self::Output {
        &mut self.data[index.0]
    }
}
