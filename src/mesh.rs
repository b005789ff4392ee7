//! Wavefront OBJ loading for the model tutorial.
//!
//! Parsing is delegated to `tobj`. Faces are triangulated and de-indexed, so the returned
//! [`Mesh`] holds one entry per triangle corner and can be drawn with a plain vertex count.

use std::io::BufRead;
use std::path::Path;

use crate::error::MeshError;

/// Triangle soup read from an OBJ file.
///
/// `uvs` and `normals` are either empty (the file has none) or exactly as long as `positions`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Loads and flattens every object in the OBJ file at `path`.
pub fn load_mesh(path: &Path) -> Result<Mesh, MeshError> {
    let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
    if let Err(error) = materials {
        log::debug!("ignoring materials of {}: {error}", path.display());
    }
    let mesh = flatten(&models)?;
    log::info!(
        "loaded {} ({} objects, {} vertices)",
        path.display(),
        models.len(),
        mesh.vertex_count()
    );
    Ok(mesh)
}

/// Parses OBJ text from `reader`. Material libraries are not resolved.
pub fn parse_mesh<R: BufRead>(reader: &mut R) -> Result<Mesh, MeshError> {
    let (models, _) = tobj::load_obj_buf(reader, &tobj::GPU_LOAD_OPTIONS, |_: &Path| {
        Err(tobj::LoadError::OpenFileFailed)
    })?;
    flatten(&models)
}

fn flatten(models: &[tobj::Model]) -> Result<Mesh, MeshError> {
    let with_uvs = models.iter().any(|model| !model.mesh.texcoords.is_empty());
    let with_normals = models.iter().any(|model| !model.mesh.normals.is_empty());
    let corners: usize = models.iter().map(|model| model.mesh.indices.len()).sum();
    if corners == 0 {
        return Err(MeshError::Empty);
    }

    let mut mesh = Mesh {
        positions: Vec::with_capacity(corners),
        uvs: Vec::with_capacity(if with_uvs { corners } else { 0 }),
        normals: Vec::with_capacity(if with_normals { corners } else { 0 }),
    };

    for model in models {
        let source = &model.mesh;
        for &index in &source.indices {
            let index = index as usize;
            mesh.positions.push(element(&source.positions, index)?);
            if with_uvs {
                mesh.uvs.push(if source.texcoords.is_empty() {
                    [0.0; 2]
                } else {
                    element(&source.texcoords, index)?
                });
            }
            if with_normals {
                mesh.normals.push(if source.normals.is_empty() {
                    [0.0; 3]
                } else {
                    element(&source.normals, index)?
                });
            }
        }
    }

    Ok(mesh)
}

/// Reads the `index`-th `N`-tuple out of a flat float array.
fn element<const N: usize>(data: &[f32], index: usize) -> Result<[f32; N], MeshError> {
    data.get(index * N..index * N + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(MeshError::IndexOutOfRange {
            index,
            len: data.len() / N,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "\
o quad
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1 4/4/1
";

    #[test]
    fn quad_is_triangulated_and_deindexed() {
        let mesh = parse_mesh(&mut QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.uvs.len(), 6);
        assert_eq!(mesh.normals.len(), 6);

        assert_eq!(mesh.positions[0], [-1.0, -1.0, 0.0]);
        assert_eq!(mesh.uvs[0], [0.0, 0.0]);
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 0.0, 1.0]));
        // Both triangles share the first corner of the fan.
        assert_eq!(mesh.positions[3], mesh.positions[0]);
    }

    #[test]
    fn positions_only_mesh_has_no_uvs_or_normals() {
        let obj = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = parse_mesh(&mut obj.as_bytes()).unwrap();
        assert_eq!(mesh.positions, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(mesh.uvs.is_empty());
        assert!(mesh.normals.is_empty());
    }

    #[test]
    fn mesh_without_faces_is_rejected() {
        let obj = "v 0 0 0\nv 1 0 0\n";
        assert!(matches!(
            parse_mesh(&mut obj.as_bytes()),
            Err(MeshError::Empty)
        ));
    }

    #[test]
    fn missing_file_is_a_parse_error() {
        let missing = std::env::temp_dir().join("tutorial-core-no-such-model.obj");
        assert!(matches!(load_mesh(&missing), Err(MeshError::Parse(_))));
    }

    #[test]
    fn element_checks_bounds() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(element::<2>(&data, 1).unwrap(), [3.0, 4.0]);
        assert!(matches!(
            element::<3>(&data, 1),
            Err(MeshError::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn shipped_cube_faces_outward() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/models/cube.obj");
        let mesh = load_mesh(&path).unwrap();
        assert_eq!(mesh.vertex_count(), 36);
        assert_eq!(mesh.uvs.len(), 36);

        for triangle in mesh.positions.chunks(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(nalgebra_glm::Vec3::from);
            let normal = (b - a).cross(&(c - a));
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(&centroid) > 0.0, "inward face at {centroid:?}");
        }
    }
}
