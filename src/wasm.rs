use crate::error::KdTreeError;
use crate::kdtree::KdTree;
use wasm_bindgen::prelude::*;
use js_sys::Array;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = initThreads)]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

fn to_js(e: KdTreeError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Reads a plain JS array of numbers into coordinates.
///
/// Returns `None` if the value is not an array or holds anything other than numbers.
pub fn parse_js_coords(val: &JsValue) -> Option<Vec<f64>> {
    let arr = val.dyn_ref::<Array>()?;
    let mut coords = Vec::with_capacity(arr.length() as usize);
    for i in 0..arr.length() {
        coords.push(arr.get(i).as_f64()?);
    }
    Some(coords)
}

/// WASM wrapper around [`KdTree`].
///
/// Errors are thrown as JS strings carrying the error message.
#[wasm_bindgen(js_name = KdTree)]
pub struct KdTreeWASM {
    inner: KdTree,
}

#[wasm_bindgen(js_class = KdTree)]
impl KdTreeWASM {
    #[wasm_bindgen(constructor)]
    pub fn new(k: usize) -> Result<KdTreeWASM, JsValue> {
        Ok(KdTreeWASM {
            inner: KdTree::new(k).map_err(to_js)?,
        })
    }

    pub fn insert(&mut self, coords: &[f64]) -> Result<(), JsValue> {
        self.inner.insert(coords).map_err(to_js)
    }

    /// Inserts a point given as a plain JS array, e.g. `tree.insertPoint([2, 3])`.
    #[wasm_bindgen(js_name = insertPoint)]
    pub fn insert_point(&mut self, val: JsValue) -> Result<(), JsValue> {
        let coords = parse_js_coords(&val).ok_or_else(|| JsValue::from_str("expected an array of numbers"))?;
        self.inner.insert(&coords).map_err(to_js)
    }

    /// Inserts every point of a flat `Float64Array`.
    #[wasm_bindgen(js_name = insertFlat)]
    pub fn insert_flat(&mut self, coords: &[f64]) -> Result<(), JsValue> {
        self.inner.extend_from_flat(coords).map_err(to_js)
    }

    #[wasm_bindgen(js_name = randomPoints)]
    pub fn random_points(&mut self, count: usize, min: f64, max: f64) -> Result<(), JsValue> {
        self.inner.random_points(count, min, max).map_err(to_js)
    }

    /// Coordinates of the nearest stored point, or `undefined` for an empty tree.
    pub fn nearest(&self, target: &[f64]) -> Result<Option<Vec<f64>>, JsValue> {
        let found = self.inner.nearest(target).map_err(to_js)?;
        Ok(found.map(|p| p.coords().to_vec()))
    }

    pub fn rebalance(&mut self) {
        self.inner.rebalance();
    }

    #[wasm_bindgen(getter)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[wasm_bindgen(getter)]
    pub fn depth(&self) -> usize {
        self.inner.depth()
    }

    #[wasm_bindgen(getter)]
    pub fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    /// All stored points as one flat array, in pre-order.
    #[wasm_bindgen(getter)]
    pub fn points(&self) -> Vec<f64> {
        self.inner.iter().flat_map(|p| p.coords().iter().copied()).collect()
    }
}
