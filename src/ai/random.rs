use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::Rng;

/// `[0, 1)` 均匀随机数来源，难度策略通过它做随机分支。
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;

    /// 从切片中均匀取一个元素：`items[floor(r * len)]`。
    fn pick<T: Copy>(&mut self, items: &[T]) -> Option<T>
    where
        Self: Sized,
    {
        if items.is_empty() {
            return None;
        }
        let slot = (self.next_unit() * items.len() as f64) as usize;
        items.get(slot.min(items.len() - 1)).copied()
    }
}

impl RandomSource for SmallRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// 按固定序列返回数值，用完后循环。测试用它精确控制分支。
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
    consumed: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values
                .into_iter()
                .map(|value| value.clamp(0.0, 1.0 - f64::EPSILON))
                .collect(),
            consumed: 0,
        }
    }

    /// 已经读取的数值个数。
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.consumed += 1;
        match self.values.pop_front() {
            Some(value) => {
                self.values.push_back(value);
                value
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn scripted_values_repeat_in_order() {
        let mut rng = ScriptedRandom::new([0.1, 0.9]);
        assert_eq!(rng.next_unit(), 0.1);
        assert_eq!(rng.next_unit(), 0.9);
        assert_eq!(rng.next_unit(), 0.1);
        assert_eq!(rng.consumed(), 3);
    }

    #[test]
    fn pick_maps_unit_interval_onto_slots() {
        let items = [3usize, 5, 7];
        let mut rng = ScriptedRandom::new([0.0, 0.34, 0.99, 1.0]);
        assert_eq!(rng.pick(&items), Some(3));
        assert_eq!(rng.pick(&items), Some(5));
        assert_eq!(rng.pick(&items), Some(7));
        assert_eq!(rng.pick(&items), Some(7));
        assert_eq!(rng.pick::<usize>(&[]), None);
    }

    #[test]
    fn seeded_small_rng_stays_in_unit_interval() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..1000 {
            let value = rng.next_unit();
            assert!((0.0..1.0).contains(&value));
        }
    }
}
