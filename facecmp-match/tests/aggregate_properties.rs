use anyhow::Result;
use facecmp_match::{aggregate, ComparisonMatrix, DistanceMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random symmetric matrices with a meaningless diagonal.
fn random_case(rng: &mut StdRng, n: usize) -> (Vec<Vec<bool>>, Vec<Vec<f64>>) {
    let mut m = vec![vec![false; n]; n];
    let mut d = vec![vec![0.0; n]; n];
    for i in 0..n {
        m[i][i] = rng.gen();
        d[i][i] = rng.gen_range(-1.0..1.0);
        for j in i + 1..n {
            let dist = rng.gen_range(0.0..1.5);
            let hit = rng.gen_bool(0.4);
            m[i][j] = hit;
            m[j][i] = hit;
            d[i][j] = dist;
            d[j][i] = dist;
        }
    }
    (m, d)
}

#[test]
fn summaries_agree_with_raw_matrices() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let n = rng.gen_range(0..=4);
        let (m_rows, d_rows) = random_case(&mut rng, n);
        let m = ComparisonMatrix::from_rows(m_rows.clone())?;
        let d = DistanceMatrix::from_rows(d_rows.clone())?;

        let summaries = aggregate(&m, &d)?;
        assert_eq!(summaries.len(), n);

        for (i, s) in summaries.iter().enumerate() {
            let expected: Vec<usize> = (0..n).filter(|&j| j != i && m_rows[i][j]).collect();
            assert_eq!(s.matches, expected);
            assert!(!s.matches.contains(&i));
            assert_eq!(s.has_match, (0..n).any(|j| j != i && m_rows[i][j]));
            assert_eq!(s.has_match, !s.matches.is_empty());
            assert_eq!(s.all_distances.len(), s.matches.len());

            let best = expected
                .iter()
                .map(|&j| d_rows[i][j])
                .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.min(x))));
            assert_eq!(s.best_distance, best);
        }

        assert_eq!(aggregate(&m, &d)?, summaries);
    }
    Ok(())
}
