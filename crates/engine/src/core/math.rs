pub type Vec3 = nalgebra::Vector3<f32>;

pub fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}
